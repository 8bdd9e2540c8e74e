//! Terminal input parsing.
//!
//! A line is one of:
//! - `quit` / `exit` / `q`
//! - `imu <angle_x> [<accel_angle_x>]`, a sensor frame in degrees
//! - `u <value>` / `perturb <value>`, a raw perturbation
//! - any run of command keys (`lLgGtTmrkK`), applied in order

use moodloop_core::{Axes, ControlCommand, ImuFrame};
use moodloop_limbic::LoopInput;

#[derive(Debug, Clone, PartialEq)]
pub enum LineAction {
    Send(Vec<LoopInput>),
    Quit,
}

pub fn parse_line(line: &str) -> Result<LineAction, String> {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(LineAction::Send(Vec::new()));
    };

    match head {
        "quit" | "exit" | "q" => Ok(LineAction::Quit),
        "imu" => {
            let angle = parse_number(words.next(), "imu angle")?;
            let accel_angle = match words.next() {
                Some(word) => parse_number(Some(word), "imu accel angle")?,
                None => 0.0,
            };
            let frame = ImuFrame {
                angle: Axes::new(angle, 0.0, 0.0),
                accel_angle: Axes::new(accel_angle, 0.0, 0.0),
                ..Default::default()
            };
            Ok(LineAction::Send(vec![LoopInput::Imu(frame)]))
        }
        "u" | "perturb" => {
            let value = parse_number(words.next(), "perturbation")?;
            Ok(LineAction::Send(vec![LoopInput::Perturbation(value)]))
        }
        _ => trimmed
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|key| {
                ControlCommand::from_key(key)
                    .map(LoopInput::Command)
                    .ok_or_else(|| format!("Unknown command key '{}'", key))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(LineAction::Send),
    }
}

fn parse_number(word: Option<&str>, what: &str) -> Result<f64, String> {
    let word = word.ok_or_else(|| format!("Missing {}", what))?;
    match word.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid {}: '{}'", what, word)),
    }
}
