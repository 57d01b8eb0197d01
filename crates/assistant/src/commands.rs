//! Line commands of the terminal front end.
//!
//! Lines starting with `/` are commands; anything else is chat text for the
//! agent.

use vidchat_core::edit_queue::EditMutation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Accept(String),
    Reject(String),
    Undo(String),
    Recommendations,
    Back,
    Forward,
    Edits,
    MutateEdit {
        mutation: EditMutation,
        edit_id: String,
    },
    Sessions,
    Open(String),
    Rename(String),
    Delete,
    Versions,
    Export,
    Dismiss,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command '/{0}', try /help")]
    Unknown(String),

    #[error("/{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

pub const HELP: &str = "\
Type a message to talk to the editor, or:
  /accept <id>      accept a recommendation
  /reject <id>      reject a recommendation
  /undo <id>        undo the latest accepted recommendation
  /recs             list recommendations by status
  /back, /forward   move through video versions
  /edits            show the edit queue
  /remove <edit>    remove an edit
  /reactivate <edit>
  /deactivate <edit>
  /sessions         list your sessions
  /open <session>   switch to a session
  /rename <name>    rename this session
  /delete           delete this session
  /versions         list stored versions
  /export           publish the current version
  /dismiss          hide the save-error banner
  /quit";

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "accept" => Command::Accept(required(arg, "accept", "a recommendation id")?),
        "reject" => Command::Reject(required(arg, "reject", "a recommendation id")?),
        "undo" => Command::Undo(required(arg, "undo", "a recommendation id")?),
        "recs" | "recommendations" => Command::Recommendations,
        "back" => Command::Back,
        "forward" => Command::Forward,
        "edits" => Command::Edits,
        "remove" => mutate(EditMutation::Remove, arg, "remove")?,
        "reactivate" => mutate(EditMutation::Reactivate, arg, "reactivate")?,
        "deactivate" => mutate(EditMutation::Deactivate, arg, "deactivate")?,
        "sessions" => Command::Sessions,
        "open" => Command::Open(required(arg, "open", "a session id")?),
        "rename" => Command::Rename(required(arg, "rename", "a name")?),
        "delete" => Command::Delete,
        "versions" => Command::Versions,
        "export" => Command::Export,
        "dismiss" => Command::Dismiss,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required(
    arg: &str,
    command: &'static str,
    argument: &'static str,
) -> Result<String, ParseError> {
    if arg.is_empty() {
        return Err(ParseError::MissingArgument { command, argument });
    }
    Ok(arg.to_string())
}

fn mutate(
    mutation: EditMutation,
    arg: &str,
    command: &'static str,
) -> Result<Command, ParseError> {
    Ok(Command::MutateEdit {
        mutation,
        edit_id: required(arg, command, "an edit id")?,
    })
}
