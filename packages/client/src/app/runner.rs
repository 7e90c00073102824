//! Interactive terminal loop.
//!
//! Line editing runs on a dedicated blocking thread (rustyline is
//! synchronous) and feeds the async loop through a channel; the loop
//! multiplexes user input against live connection events.

use std::io::{self, Write};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::connection::reconnect::ReconnectPolicy;

use super::controller::{ChatController, ViewEvent};
use super::formatter::MessageFormatter;

enum LoopAction {
    Continue,
    Quit,
}

/// Run the interactive client until the user quits or input ends.
pub async fn run(
    mut controller: ChatController,
    policy: ReconnectPolicy,
    initial_channel: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let username = controller.session().username.clone();
    println!(
        "\nYou are '{username}'. Type a message and press Enter to send.\n\
         Commands: /channels /create <name> /join <id> /leave /quit\n"
    );

    match controller.list_channels().await {
        Ok(channels) => println!("{}", MessageFormatter::format_channel_list(&channels)),
        Err(error) => tracing::warn!(%error, "could not list channels"),
    }

    if let Some(name) = initial_channel {
        open_and_show(&mut controller, &name).await;
    }

    let mut input_rx = spawn_readline_thread(username.clone());

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // Input thread ended (Ctrl+C / Ctrl+D).
                    break;
                };
                if let LoopAction::Quit = handle_line(&mut controller, &line).await {
                    break;
                }
                redisplay_prompt(&username);
            }
            event = controller.next_event() => {
                if let Some(event) = event {
                    handle_event(&mut controller, &policy, event).await;
                    redisplay_prompt(&username);
                }
            }
        }
    }

    controller.close_channel().await;
    tracing::info!("client session ended");
    Ok(())
}

/// Blocking readline thread feeding trimmed non-empty lines to the loop.
fn spawn_readline_thread(username: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(error) => {
                eprintln!("failed to initialize readline: {error}");
                return;
            }
        };
        let prompt = format!("{username}> ");
        loop {
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(error) => {
                    tracing::error!(%error, "readline error");
                    break;
                }
            }
        }
    });
    input_rx
}

async fn handle_line(controller: &mut ChatController, line: &str) -> LoopAction {
    if let Some(command) = line.strip_prefix('/') {
        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        match name {
            "quit" => return LoopAction::Quit,
            "channels" => match controller.list_channels().await {
                Ok(channels) => {
                    println!("{}", MessageFormatter::format_channel_list(&channels));
                }
                Err(error) => tracing::warn!(%error, "could not list channels"),
            },
            "create" if !argument.is_empty() => match controller.create_channel(argument).await {
                Ok(summary) => open_and_show(controller, &summary.channel_name).await,
                Err(error) => tracing::warn!(%error, "could not create channel"),
            },
            "join" if !argument.is_empty() => match controller.join_channel(argument).await {
                Ok(summary) => open_and_show(controller, &summary.channel_name).await,
                Err(error) => tracing::warn!(%error, "could not join channel"),
            },
            "leave" => {
                if let Err(error) = controller.leave_channel().await {
                    tracing::warn!(%error, "could not leave channel");
                }
            }
            _ => println!("unknown command: /{name}"),
        }
        return LoopAction::Continue;
    }

    // Plain text is a chat message; failures already surface as notices.
    if let Err(error) = controller.send_chat(line).await {
        tracing::debug!(%error, "send failed");
    }
    LoopAction::Continue
}

async fn handle_event(
    controller: &mut ChatController,
    policy: &ReconnectPolicy,
    event: ViewEvent,
) {
    controller.apply_event(&event);
    match &event {
        ViewEvent::Opened => {}
        ViewEvent::Notice(_) | ViewEvent::Chat { .. } => {
            if let Some(entry) = controller.timeline().and_then(|timeline| timeline.last()) {
                println!("\n{}", MessageFormatter::format_entry(entry));
            }
        }
        ViewEvent::ConnectionLost(_) => {
            recover_connection(controller, policy).await;
        }
    }
}

/// Open a channel and print its history block. Errors are reported and
/// swallowed; the loop keeps running so the user can try another channel.
async fn open_and_show(controller: &mut ChatController, name: &str) {
    match controller.open_channel(name).await {
        Ok(()) => {
            if let Some(timeline) = controller.timeline() {
                println!("{}", MessageFormatter::format_history(name, timeline));
            }
        }
        Err(error) => tracing::warn!(%error, channel = name, "could not open channel"),
    }
}

/// Walk the reconnect schedule until one attempt succeeds or it is
/// exhausted. Returns whether the channel came back.
async fn recover_connection(controller: &mut ChatController, policy: &ReconnectPolicy) -> bool {
    let Some(channel_name) = controller
        .active_channel()
        .map(|channel| channel.channel_name.clone())
    else {
        return false;
    };
    for attempt in 0..policy.max_attempts() {
        let Some(delay) = policy.delay_before(attempt) else {
            break;
        };
        tracing::info!(
            attempt = attempt + 1,
            max_attempts = policy.max_attempts(),
            delay_ms = delay.as_millis() as u64,
            "reconnecting"
        );
        tokio::time::sleep(delay).await;
        match controller.open_channel(&channel_name).await {
            Ok(()) => {
                tracing::info!(channel = %channel_name, "reconnected");
                return true;
            }
            Err(error) => {
                tracing::warn!(%error, attempt = attempt + 1, "reconnect attempt failed");
            }
        }
    }
    tracing::error!(
        max_attempts = policy.max_attempts(),
        "giving up on reconnecting"
    );
    false
}

fn redisplay_prompt(username: &str) {
    print!("{username}> ");
    let _ = io::stdout().flush();
}
