use std::io::Write;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local};
use clap::ValueEnum;
use futures::StreamExt;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tokio_stream::wrappers::LinesStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    app::{
        command::SessionCommand, module::SessionModule, session::TrackerSession,
        shutdown::detect_shutdown,
    },
    model::FilterMode,
    storage::TrackerStore,
};

use super::{
    dates::{parse_day, DateStyle},
    render::render_main,
};

const HELP: &str = "\
Commands:
  t, toggle <tracker>   mark the tracker done or not done on the selected day
  pin <tracker>         pin or unpin the tracker
  d, date <day>         select a day, e.g. \"yesterday\" or \"15/03/2025\"
  n, next / p, prev     move to the next or previous day
  s, search [text]      show trackers containing the text, empty to reset
  f, filter <mode>      all, today, completed or not-completed
  r, reload             read everything from disk again
  q, quit               leave";

/// A line typed into the shell.
#[derive(Debug, PartialEq, Eq)]
pub enum ShellInput {
    Command(SessionCommand),
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str, style: DateStyle, now: DateTime<Local>) -> Result<ShellInput> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let required = |what: &str| {
        if rest.is_empty() {
            Err(anyhow!("{word} needs {what}"))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match word {
        "" => return Ok(ShellInput::Empty),
        "q" | "quit" | "exit" => return Ok(ShellInput::Quit),
        "h" | "help" | "?" => return Ok(ShellInput::Help),
        "t" | "toggle" => SessionCommand::Toggle(required("a tracker")?),
        "pin" => SessionCommand::Pin(required("a tracker")?),
        "d" | "date" => SessionCommand::SelectDate(parse_day(&required("a day")?, style, now)?),
        "n" | "next" => SessionCommand::ShiftDate(1),
        "p" | "prev" => SessionCommand::ShiftDate(-1),
        "s" | "search" => SessionCommand::Search(rest.to_string()),
        "f" | "filter" => SessionCommand::Filter(
            <FilterMode as ValueEnum>::from_str(&required("a mode")?, true)
                .map_err(|e| anyhow!(e))?,
        ),
        "r" | "reload" => SessionCommand::Reload,
        _ => bail!("Unknown command {word:?}, type help for the list"),
    };
    Ok(ShellInput::Command(command))
}

/// Interactive mode. The main screen is printed after every change; lines from stdin are
/// turned into commands for the session event loop. Ends on quit, end of input or ctrl-c.
pub async fn run_shell<S: TrackerStore>(
    session: TrackerSession<S>,
    style: DateStyle,
) -> Result<TrackerSession<S>> {
    let (sender, receiver) = mpsc::channel::<SessionCommand>(16);
    let shutdown = CancellationToken::new();

    let module = SessionModule::new(session, receiver, shutdown.clone(), |session| {
        print!("\n{}> ", render_main(session));
        let _ = std::io::stdout().flush();
    });

    let (_, input_result, session) = tokio::join!(
        detect_shutdown(shutdown.clone()),
        read_commands(sender, shutdown.clone(), style),
        async {
            let result = module.run().await;
            shutdown.cancel();
            result
        },
    );
    println!();

    if let Err(e) = input_result {
        error!("Failed reading input {e:?}");
    }
    session
}

async fn read_commands(
    sender: mpsc::Sender<SessionCommand>,
    shutdown: CancellationToken,
    style: DateStyle,
) -> Result<()> {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let result = loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break Ok(()),
            line = lines.next() => line,
        };
        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => break Err(e.into()),
            None => break Ok(()),
        };
        debug!("Shell input {line:?}");

        match parse_line(&line, style, Local::now()) {
            Ok(ShellInput::Command(command)) => {
                if sender.send(command).await.is_err() {
                    break Ok(());
                }
            }
            Ok(ShellInput::Help) => print!("{HELP}\n> "),
            Ok(ShellInput::Empty) => print!("> "),
            Ok(ShellInput::Quit) => break Ok(()),
            Err(e) => print!("{e}\n> "),
        }
        let _ = std::io::stdout().flush();
    };
    shutdown.cancel();
    result
}
