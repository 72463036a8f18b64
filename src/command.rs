//! Interactive commands.
//!
//! One line of input maps to one `Command`; each command stands in for a
//! single control of the dashboard (input buttons, start/stop, reset, ...).

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

use crate::catalog::{self, SAMPLE_ACTIVITIES};
use crate::ingest::InputKind;

pub const HELP: &str = "\
commands:
  webcam            select the webcam
  video [path]      select video input, optionally loading an MJPEG clip
  image [path]      select image input, optionally loading a JPEG/PNG
  start | stop      start or stop processing
  toggle            start/stop button
  reset             stop and clear everything
  health            re-check the backend
  history [n]       list recent server-side predictions
  export <path>     write the session snapshot as JSON
  status            show the current state
  help              show this text
  quit              stop and exit";

/// `HELP` followed by the model in use and an example of the activity feed.
pub fn help_text() -> String {
    let model = catalog::default_model();
    let mut text = format!(
        "{}\n\nmodel: {} ({}, ~{} fps, {:.0}% accuracy)\nexample feed:",
        HELP,
        model.name,
        model.description,
        model.fps,
        model.accuracy * 100.0
    );
    for sample in SAMPLE_ACTIVITIES {
        text.push_str(&format!("\n  {:<10} {:>3.0}%", sample.name, sample.confidence));
    }
    text
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Select {
        kind: InputKind,
        path: Option<PathBuf>,
    },
    Start,
    Stop,
    Toggle,
    Reset,
    Health,
    History(Option<u32>),
    Export(PathBuf),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then_some(rest);

        let command = match word.to_ascii_lowercase().as_str() {
            "webcam" | "video" | "image" => Command::Select {
                kind: word.parse()?,
                path: arg.map(PathBuf::from),
            },
            "start" => Command::Start,
            "stop" => Command::Stop,
            "toggle" => Command::Toggle,
            "reset" => Command::Reset,
            "health" => Command::Health,
            "history" => Command::History(
                arg.map(|n| n.parse::<u32>())
                    .transpose()
                    .with_context(|| format!("invalid history count '{}'", rest))?,
            ),
            "export" => Command::Export(PathBuf::from(
                arg.ok_or_else(|| anyhow!("export needs a destination path"))?,
            )),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "" => return Err(anyhow!("empty command")),
            other => return Err(anyhow!("unknown command '{}'; try 'help'", other)),
        };
        if arg.is_some()
            && !matches!(
                command,
                Command::Select { .. } | Command::History(_) | Command::Export(_)
            )
        {
            return Err(anyhow!("'{}' takes no arguments", word));
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_button_commands() -> Result<()> {
        assert_eq!("start".parse::<Command>()?, Command::Start);
        assert_eq!("  Toggle ".parse::<Command>()?, Command::Toggle);
        assert_eq!("q".parse::<Command>()?, Command::Quit);
        assert_eq!(
            "webcam".parse::<Command>()?,
            Command::Select {
                kind: InputKind::Webcam,
                path: None
            }
        );
        Ok(())
    }

    #[test]
    fn parses_paths_and_counts() -> Result<()> {
        assert_eq!(
            "video clips/walk 1.mjpeg".parse::<Command>()?,
            Command::Select {
                kind: InputKind::Video,
                path: Some(PathBuf::from("clips/walk 1.mjpeg"))
            }
        );
        assert_eq!("history".parse::<Command>()?, Command::History(None));
        assert_eq!("history 10".parse::<Command>()?, Command::History(Some(10)));
        assert_eq!(
            "export out.json".parse::<Command>()?,
            Command::Export(PathBuf::from("out.json"))
        );
        Ok(())
    }

    #[test]
    fn help_lists_model_and_sample_feed() {
        let text = help_text();
        assert!(text.starts_with(HELP));
        assert!(text.contains("model: YOLOv8n Pose"));
        for sample in SAMPLE_ACTIVITIES {
            assert!(text.contains(sample.name));
        }
        assert!(text.contains("Running     85%"));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!("".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
        assert!("export".parse::<Command>().is_err());
        assert!("history ten".parse::<Command>().is_err());
        assert!("stop now".parse::<Command>().is_err());
    }
}
