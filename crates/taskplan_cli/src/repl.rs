//! Interactive prompt loop.

use crate::render::render_outcome;
use eyre::{eyre, Result};
use log::{info, warn};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use taskplan_core::{dispatch, parse_line, CommandError, Outcome, Planner, TaskStore};

const PROMPT: &str = ">>> ";

/// Reads commands until `quit`, Ctrl-C or Ctrl-D.
///
/// Command errors are printed and the loop continues; only editor failures
/// end the session with an error.
pub fn run<S: TaskStore>(planner: &mut Planner<S>) -> Result<()> {
    let mut editor =
        DefaultEditor::new().map_err(|err| eyre!("failed to initialize readline: {err}"))?;

    println!("taskplan {} - type `help` for commands", taskplan_core::core_version());

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input);

                match execute(planner, input) {
                    Ok(Some(Outcome::Exit)) => break,
                    Ok(Some(outcome)) => print!("{}", render_outcome(&outcome)),
                    Ok(None) => {}
                    Err(err) => {
                        warn!(
                            "event=command module=cli status=error kind={:?}",
                            err.kind()
                        );
                        println!("error: {err}");
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => return Err(eyre!("readline error: {err}")),
        }
    }

    info!("event=repl_exit module=cli status=ok");
    Ok(())
}

fn execute<S: TaskStore>(
    planner: &mut Planner<S>,
    input: &str,
) -> Result<Option<Outcome>, CommandError> {
    let Some(command) = parse_line(input)? else {
        return Ok(None);
    };
    dispatch(planner, command).map(Some)
}
