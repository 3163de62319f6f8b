// Line-oriented command parsing for the console

use common::orchestrator::UiEvent;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  objects                   list available objects
  select <name>|none        choose the object to deduplicate
  fields <a,b,...>          choose the fields to match on
  threshold <field> <0-100> set a field's similarity threshold
  dependents on|off         include dependent objects
  schedule on|off           enable the daily job
  time <HH:mm>              daily trigger time (12h and HH:mm:ss.SSS also accepted)
  emails <list>             error notification recipients
  start                     start now, or terminate the scheduled job
  save                      save the schedule
  remove                    remove the scheduled job
  show                      print the current configuration
  help                      print this text
  quit                      exit";

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Event(UiEvent),
    Objects,
    Show,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

fn parse_switch(argument: &str, usage: &'static str) -> Result<bool, CommandError> {
    match argument.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(CommandError::Usage(usage)),
    }
}

/// Parse one input line
pub fn parse(line: &str) -> Result<ConsoleCommand, CommandError> {
    let line = line.trim();
    let (keyword, argument) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };

    let command = match keyword.to_ascii_lowercase().as_str() {
        "" => return Err(CommandError::Empty),
        "objects" => ConsoleCommand::Objects,
        "show" => ConsoleCommand::Show,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        "select" => {
            if argument.is_empty() {
                return Err(CommandError::Usage("select <name>|none"));
            }
            let object = (!argument.eq_ignore_ascii_case("none")).then(|| argument.to_string());
            ConsoleCommand::Event(UiEvent::SelectObject(object))
        }
        "fields" => {
            let fields = argument
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            ConsoleCommand::Event(UiEvent::SetFields(fields))
        }
        "threshold" => {
            let usage = "threshold <field> <value>";
            let (field, value) = argument
                .rsplit_once(char::is_whitespace)
                .ok_or(CommandError::Usage(usage))?;
            // Out-of-range values are accepted here and rejected on submission
            let value = value
                .trim()
                .parse::<i32>()
                .map_err(|_| CommandError::Usage(usage))?;
            ConsoleCommand::Event(UiEvent::SetThreshold {
                field: field.trim().to_string(),
                value,
            })
        }
        "dependents" => ConsoleCommand::Event(UiEvent::SetIncludeDependents(parse_switch(
            argument,
            "dependents on|off",
        )?)),
        "schedule" => ConsoleCommand::Event(UiEvent::SetScheduled(parse_switch(
            argument,
            "schedule on|off",
        )?)),
        "time" => {
            let time = (!argument.is_empty()).then(|| argument.to_string());
            ConsoleCommand::Event(UiEvent::SetScheduleTime(time))
        }
        "emails" => ConsoleCommand::Event(UiEvent::SetErrorEmails(argument.to_string())),
        "start" | "terminate" => ConsoleCommand::Event(UiEvent::StartOrTerminate),
        "save" => ConsoleCommand::Event(UiEvent::SaveSchedule),
        "remove" => ConsoleCommand::Event(UiEvent::RemoveSchedule),
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(command)
}
