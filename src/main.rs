use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use carebow_triage::config::{self, EngineConfig};
use carebow_triage::models::enums::{ActionId, MessageType};
use carebow_triage::models::{Message, ProfileContext};
use carebow_triage::triage::{
    dispatch_action, ActionHandler, CtaAction, KnowledgeBase, TriageEngine, TriageError,
    TriageSession, TurnOutcome,
};

const USAGE: &str = "usage: carebow-triage <profile.json> [resources-dir]";

/// Prints what a device would do for an action.
struct ConsoleActions<W: Write> {
    out: W,
}

impl<W: Write> ActionHandler for ConsoleActions<W> {
    type Error = io::Error;

    fn dial(&mut self, number: &str) -> Result<(), io::Error> {
        writeln!(self.out, "[calling {number}]")
    }

    fn open_map(&mut self, query: &str) -> Result<(), io::Error> {
        writeln!(self.out, "[opening map: {query}]")
    }

    fn present(&mut self, action_id: ActionId) -> Result<(), io::Error> {
        writeln!(self.out, "[{action_id}]")
    }
}

fn main() -> ExitCode {
    carebow_triage::init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(profile_path) = args.next().map(PathBuf::from) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let resources_dir = args.next().map(PathBuf::from);

    match run(&profile_path, resources_dir.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(profile_path: &Path, resources_dir: Option<&Path>) -> Result<(), TriageError> {
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let profile = ProfileContext::load(profile_path)?;
    let engine = match resources_dir {
        Some(dir) => {
            let config_path = dir.join("engine.json");
            let config_path = config_path.exists().then_some(config_path.as_path());
            TriageEngine::load(dir, config_path)?
        }
        None => TriageEngine::new(KnowledgeBase::builtin(), EngineConfig::default()),
    };
    let engine = Arc::new(engine);

    let mut session = TriageSession::start(Arc::clone(&engine), profile);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_messages(&mut out, session.transcript())?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let input = line.trim();

        if let Some(candidate) = input.strip_prefix("/check ") {
            session.check_treatment(candidate.trim());
            if let Some(last) = session.transcript().last() {
                print_messages(&mut out, std::slice::from_ref(last))?;
            }
            continue;
        }
        if let Some(action) = input.strip_prefix("/action ") {
            let mut handler = ConsoleActions { out: &mut out };
            dispatch_action(action.trim(), &engine.config, &mut handler)?;
            continue;
        }
        if input == "/summary" {
            writeln!(out, "{}", session.summary().to_text())?;
            continue;
        }
        match input {
            "/help" => {
                print_help(&mut out)?;
                continue;
            }
            "/exit" | "/quit" => break,
            _ => {}
        }
        match session.submit(input) {
            Ok(appended) => print_messages(&mut out, appended)?,
            Err(TriageError::ConversationClosed) => {
                writeln!(out, "(conversation finished; type /help for commands)")?;
                continue;
            }
            Err(e) => return Err(e),
        }

        match session.outcome() {
            TurnOutcome::Assessed(a) => print_actions(&mut out, &a.cta.actions())?,
            TurnOutcome::Emergency(e) => print_actions(&mut out, &e.cta.actions())?,
            TurnOutcome::AwaitingAnswer { .. } => {}
        }
    }

    Ok(())
}

fn print_help(out: &mut impl Write) -> Result<(), TriageError> {
    writeln!(out, "Available commands:")?;
    writeln!(out, "  /check <treatment>  - Check a treatment against the profile")?;
    writeln!(out, "  /action <id>        - Perform a suggested action")?;
    writeln!(out, "  /summary            - Show a shareable summary")?;
    writeln!(out, "  /exit, /quit        - Leave")?;
    writeln!(out, "Any other text is your answer to the current question.")?;
    Ok(())
}

fn print_messages(out: &mut impl Write, messages: &[Message]) -> Result<(), TriageError> {
    for m in messages {
        let who = match m.message_type {
            MessageType::User => continue,
            MessageType::Carebow => "CareBow",
            MessageType::System => "Note",
            MessageType::Emergency => "EMERGENCY",
        };
        writeln!(out, "{who}: {}", m.content)?;
        if let Some(reasoning) = &m.reasoning {
            writeln!(out, "  why: {reasoning}")?;
        }
        if let Some(insight) = &m.profile_insight {
            writeln!(out, "  profile: {insight}")?;
        }
    }
    Ok(())
}

fn print_actions(out: &mut impl Write, actions: &[&CtaAction]) -> Result<(), TriageError> {
    for action in actions {
        writeln!(out, "  > {} (/action {})", action.label, action.action_id)?;
    }
    Ok(())
}
