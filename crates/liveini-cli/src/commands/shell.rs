//! Interactive shell over one scanned session.
//!
//! `set` only edits the value held by the session; `apply` writes it to the
//! live object. `default` and `ini` work the same way.

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use liveini_core::{SettingFilter, SettingProperties};
use owo_colors::OwoColorize;
use tracing::debug;

use super::{LiveSession, Target, find_record, print_records};

const HELP: &str = "\
Commands:
  find [query]          list settings whose name matches
  show <name>           show one setting
  set <name> <value>    edit a setting (not written until apply)
  default <name>        edit a setting back to its default value
  ini <name>            edit a setting back to its scanned value
  apply <name>          write the edited value to the game
  reset                 restore and write every changed setting
  dump [path]           save the last find results
  rescan                capture and scan the process again
  quit";

const FIND_LIMIT: usize = 50;

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Find(String),
    Show(String),
    Set(String, String),
    Default(String),
    Ini(String),
    Apply(String),
    Reset,
    Dump(Option<PathBuf>),
    Rescan,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Option<ShellCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let name = || -> Result<String> {
        match rest.split_whitespace().next() {
            Some(name) => Ok(name.to_string()),
            None => bail!("{} needs a setting name", verb),
        }
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "find" | "f" => ShellCommand::Find(rest.to_string()),
        "show" => ShellCommand::Show(name()?),
        "set" => {
            let Some((name, value)) = rest.split_once(char::is_whitespace) else {
                bail!("usage: set <name> <value>");
            };
            ShellCommand::Set(name.to_string(), value.trim().to_string())
        }
        "default" => ShellCommand::Default(name()?),
        "ini" => ShellCommand::Ini(name()?),
        "apply" => ShellCommand::Apply(name()?),
        "reset" => ShellCommand::Reset,
        "dump" => ShellCommand::Dump((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "rescan" => ShellCommand::Rescan,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => bail!("unknown command: {} (try help)", other),
    };
    Ok(Some(command))
}

/// Run the shell command
pub fn run(target: &Target) -> Result<()> {
    let process = target.open()?;
    let mut session = target.scanned(&process)?;
    let mut filter = SettingFilter::default();

    println!("{} settings loaded. Type help for commands.", session.store().len());

    let stdin = io::stdin();
    loop {
        print!("liveini> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        debug!("Shell command: {:?}", command);

        if command == ShellCommand::Quit {
            break;
        }
        if let Err(e) = execute(&mut session, &mut filter, command, target) {
            eprintln!("{} {:#}", "Error:".red(), e);
        }
    }

    let changed = session
        .search(&SettingFilter::default().include(SettingProperties::CHANGED))
        .len();
    if changed > 0 {
        println!("{} settings left changed in the game", changed);
    }
    Ok(())
}

fn execute(
    session: &mut LiveSession<'_>,
    filter: &mut SettingFilter,
    command: ShellCommand,
    target: &Target,
) -> Result<()> {
    match command {
        ShellCommand::Find(query) => {
            *filter = SettingFilter::new(&query);
            let records = session.search(filter);
            println!("Results: {}/{}", records.len(), session.store().len());
            print_records(session, &records, FIND_LIMIT);
        }
        ShellCommand::Show(name) => {
            let record = find_record(session, &name)?;
            println!("{} @ {}", record.name, record.address);
            println!("  Type:    {}", record.value_type);
            println!("  Origin:  {}", record.origin);
            for (label, value) in [
                ("Default", record.raw.default),
                ("INI", record.raw.active),
                ("Live", record.active),
                ("Edited", record.current),
            ] {
                let text = session.stringify(value, record.value_type);
                println!("  {:<8} {}", format!("{}:", label), text);
            }
            if !record.value_type.is_editable() {
                println!("  read-only");
            }
            if record.changed {
                println!("  {}", "changed".yellow());
            }
        }
        ShellCommand::Set(name, value) => {
            let address = find_record(session, &name)?.address;
            session
                .store_mut()
                .get_mut(address)
                .context("setting disappeared")?
                .set_from_text(&value)?;
            println!("{} edited, use apply {} to write it", name, name);
        }
        ShellCommand::Default(name) => {
            let address = find_record(session, &name)?.address;
            session.store_mut().revert_to_default(address)?;
        }
        ShellCommand::Ini(name) => {
            let address = find_record(session, &name)?.address;
            session.store_mut().revert_to_last_ini(address)?;
        }
        ShellCommand::Apply(name) => {
            let address = find_record(session, &name)?.address;
            session.apply(address)?;
            println!("{} {}", "Applied".green(), name);
        }
        ShellCommand::Reset => {
            let restored = session.reset_all_changed();
            println!("Restored {} settings", restored);
        }
        ShellCommand::Dump(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(&target.config.dump.path));
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let count = session.dump(&mut BufWriter::new(file), filter)?;
            println!("{} settings saved to: {}", count, path.display());
        }
        ShellCommand::Rescan => {
            let count = session.rescan()?;
            println!("{} settings loaded", count);
        }
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => {}
    }
    Ok(())
}
