//! Gait commands for the motion task.
//!
//! Parsed from short text tokens (`"w 3"` = three wave cycles). The firmware
//! reads its boot and patrol sequences as such scripts.
use log::warn;

use crate::kinematics::gait_plan::GaitKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaitCommand {
    Stand,
    Walk(u8),
    Crawl(u8),
    Wave(u8),
    Tripod(u8),
    Stop,
}

impl GaitCommand {
    /// Gait and cycle count to start, `None` for [`GaitCommand::Stop`].
    pub fn gait(&self) -> Option<(GaitKind, u8)> {
        match *self {
            GaitCommand::Stand => Some((GaitKind::Stand, 0)),
            GaitCommand::Walk(n) => Some((GaitKind::Walk, n)),
            GaitCommand::Crawl(n) => Some((GaitKind::Crawl, n)),
            GaitCommand::Wave(n) => Some((GaitKind::Wave, n)),
            GaitCommand::Tripod(n) => Some((GaitKind::Tripod, n)),
            GaitCommand::Stop => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseCommandError;

impl TryFrom<&str> for GaitCommand {
    type Error = ParseCommandError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut tokens = value.split_whitespace();

        let cmd = tokens.next().ok_or(ParseCommandError)?;
        let cycles = tokens
            .next()
            .map(|s| s.parse::<u8>().unwrap_or(1))
            .unwrap_or(1);

        match cmd {
            "s" => Ok(GaitCommand::Stand),
            "d" => Ok(GaitCommand::Walk(cycles)),
            "c" => Ok(GaitCommand::Crawl(cycles)),
            "w" => Ok(GaitCommand::Wave(cycles)),
            "t" => Ok(GaitCommand::Tripod(cycles)),
            "x" => Ok(GaitCommand::Stop),
            _ => Err(ParseCommandError),
        }
    }
}

/// Commands of a newline-separated script. Blank lines and `#` comments are
/// skipped; lines that do not parse are logged and dropped.
pub fn parse_script(script: &str) -> impl Iterator<Item = GaitCommand> + '_ {
    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match GaitCommand::try_from(line) {
            Ok(cmd) => Some(cmd),
            Err(_) => {
                warn!("[COMMANDS] ignoring {line:?}");
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gaits_with_cycle_count() {
        assert_eq!(GaitCommand::try_from("w 3"), Ok(GaitCommand::Wave(3)));
        assert_eq!(GaitCommand::try_from("  c"), Ok(GaitCommand::Crawl(1)));
        assert_eq!(GaitCommand::try_from("d x"), Ok(GaitCommand::Walk(1)));
        assert_eq!(GaitCommand::try_from("t 2\n"), Ok(GaitCommand::Tripod(2)));
        assert_eq!(GaitCommand::try_from("x"), Ok(GaitCommand::Stop));
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert_eq!(GaitCommand::try_from(""), Err(ParseCommandError));
        assert_eq!(GaitCommand::try_from("jump 2"), Err(ParseCommandError));
    }

    #[test]
    fn maps_to_engine_gaits() {
        assert_eq!(GaitCommand::Stand.gait(), Some((GaitKind::Stand, 0)));
        assert_eq!(GaitCommand::Crawl(4).gait(), Some((GaitKind::Crawl, 4)));
        assert_eq!(GaitCommand::Stop.gait(), None);
    }

    #[test]
    fn script_skips_comments_and_bad_lines() {
        let script = "# boot\ns\n\n  c 2\njump\nx\n";
        let cmds: std::vec::Vec<GaitCommand> = parse_script(script).collect();
        assert_eq!(
            cmds,
            [GaitCommand::Stand, GaitCommand::Crawl(2), GaitCommand::Stop]
        );
    }
}
