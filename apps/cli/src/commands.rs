use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use client_core::{ChatClient, ClientEvent, Toggle};
use shared::{domain::ChannelId, protocol::UpdateProfileRequest};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::broadcast::{self, error::TryRecvError},
};
use tracing::debug;

use crate::attachments::image_data_url;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in and show the channel list.
    Login { email: String, password: String },
    Register {
        email: String,
        name: String,
        password: String,
        confirm: String,
    },
    Logout,
    /// List public and private channels.
    Channels,
    CreateChannel {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        private: bool,
    },
    /// Show a channel, joining it first when it is public.
    ///
    /// Privacy is taken from the channel list unless `--private` or `--public` is given.
    Open {
        channel: String,
        #[arg(long, conflicts_with = "public")]
        private: bool,
        #[arg(long)]
        public: bool,
    },
    Join {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
    },
    Leave {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
    },
    EditChannel {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Messages {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
        #[arg(long, default_value_t = 0)]
        start: u64,
    },
    /// Post text, or an image file when `--image` is given.
    Send {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
        text: Vec<String>,
    },
    EditMessage {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
        message: String,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Outside the shell, name the channel with `-c`.
    DeleteMessage {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
        message: String,
    },
    /// Add the reaction, or remove it when already there. Outside the shell, name the
    /// channel with `-c`.
    React {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
        message: String,
        emoji: String,
    },
    /// Pin or unpin. Outside the shell, name the channel with `-c`.
    Pin {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
        message: String,
    },
    /// List users who can be invited.
    Invites {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
    },
    Invite {
        /// Channel id; defaults to the one last opened in the shell.
        #[arg(short, long)]
        channel: Option<String>,
        users: Vec<String>,
    },
    Profile { user: String },
    Me,
    UpdateProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Interactive session that keeps the local cache between commands.
    Shell,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum ShellCommand {
    #[command(flatten)]
    Client(Command),
    /// Open the image viewer on one of the listed images.
    View { url: String },
    NextImage,
    PrevImage,
    Exit,
}

#[derive(Parser, Debug)]
#[command(name = "slackr", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

/// Runs one command, printing every view it renders. Errors are printed, not returned.
pub async fn run_once(client: &Arc<ChatClient>, command: Command) -> bool {
    let mut events = client.subscribe_events();
    if !matches!(command, Command::Login { .. } | Command::Register { .. }) {
        if let Err(err) = client.restore().await {
            print_error(&err);
            return false;
        }
        if command == Command::Shell {
            flush(&mut events);
        } else {
            discard(&mut events);
        }
    }

    match command {
        Command::Shell => match shell(client, &mut events).await {
            Ok(()) => true,
            Err(err) => {
                print_error(&err);
                false
            }
        },
        command => {
            let outcome = execute(client, command).await;
            flush(&mut events);
            report(outcome)
        }
    }
}

async fn shell(
    client: &Arc<ChatClient>,
    events: &mut broadcast::Receiver<ClientEvent>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"slackr> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let words = split_line(&line);
        if words.is_empty() {
            continue;
        }

        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        debug!(?command, "shell command");
        let outcome = match command {
            ShellCommand::Exit => return Ok(()),
            ShellCommand::Client(Command::Shell) => {
                println!("already in the shell");
                continue;
            }
            ShellCommand::Client(command) => execute(client, command).await,
            ShellCommand::View { url } => client.open_image_viewer(&url).await.map_err(Into::into),
            ShellCommand::NextImage => client.next_image().await.map_err(Into::into),
            ShellCommand::PrevImage => client.previous_image().await.map_err(Into::into),
        };
        flush(events);
        report(outcome);
    }
}

pub async fn execute(client: &Arc<ChatClient>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => client.login(&email, &password).await?,
        Command::Register {
            email,
            name,
            password,
            confirm,
        } => client.register(&email, &name, &password, &confirm).await?,
        Command::Logout => client.logout().await?,
        Command::Channels => {
            client.load_channels().await?;
        }
        Command::CreateChannel {
            name,
            description,
            private,
        } => {
            if let Some(channel_id) = client.create_channel(&name, &description, private).await? {
                println!("created channel {channel_id}");
            }
        }
        Command::Open {
            channel,
            private,
            public,
        } => {
            let hint = match (private, public) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            client.open_channel(&channel, hint).await?
        }
        Command::Join { channel } => client.join_channel(channel.as_deref()).await?,
        Command::Leave { channel } => client.leave_channel(channel.as_deref()).await?,
        Command::EditChannel {
            channel,
            name,
            description,
        } => {
            client
                .update_channel(channel.as_deref(), &name, &description)
                .await?
        }
        Command::Messages { channel, start } => {
            client.load_messages(channel.as_deref(), start).await?
        }
        Command::Send {
            channel,
            image,
            text,
        } => {
            let image = match image {
                Some(path) => Some(image_data_url(&path).await?),
                None => None,
            };
            client
                .send_message(channel.as_deref(), &text.join(" "), image.as_deref())
                .await?
        }
        Command::EditMessage {
            channel,
            message,
            text,
        } => {
            focus(client, channel.as_deref()).await?;
            client
                .edit_message(channel.as_deref(), &message, &text.join(" "))
                .await?
        }
        Command::DeleteMessage { channel, message } => {
            client.delete_message(channel.as_deref(), &message).await?
        }
        Command::React {
            channel,
            message,
            emoji,
        } => {
            focus(client, channel.as_deref()).await?;
            let toggle = client.toggle_reaction(&message, &emoji).await?;
            println!("reaction {}", toggle_word(toggle));
        }
        Command::Pin { channel, message } => {
            focus(client, channel.as_deref()).await?;
            let toggle = client.toggle_pin(&message).await?;
            println!("pin {}", toggle_word(toggle));
        }
        Command::Invites { channel } => client.show_invite_list(channel.as_deref()).await?,
        Command::Invite { channel, users } => {
            let users: Vec<&str> = users.iter().map(String::as_str).collect();
            client.submit_invites(channel.as_deref(), &users).await?
        }
        Command::Profile { user } => client.show_user_profile(&user).await?,
        Command::Me => client.show_own_profile().await?,
        Command::UpdateProfile {
            name,
            email,
            bio,
            password,
            image,
        } => {
            let image = match image {
                Some(path) => Some(image_data_url(&path).await?),
                None => None,
            };
            client
                .save_own_profile(UpdateProfileRequest {
                    name,
                    email,
                    bio,
                    password,
                    image,
                })
                .await?
        }
        Command::Shell => {}
    }
    Ok(())
}

/// Opens the named channel so toggles and edits see its latest messages.
async fn focus(client: &Arc<ChatClient>, channel: Option<&str>) -> anyhow::Result<()> {
    if let Some(channel) = channel {
        if client.selected_channel().await != ChannelId::parse(channel) {
            client.open_channel(channel, None).await?;
        }
    }
    Ok(())
}

fn toggle_word(toggle: Toggle) -> &'static str {
    match toggle {
        Toggle::Added => "added",
        Toggle::Removed => "removed",
    }
}

fn flush(events: &mut broadcast::Receiver<ClientEvent>) {
    loop {
        match events.try_recv() {
            Ok(ClientEvent::Rendered(view)) => println!("{view}"),
            Ok(ClientEvent::SessionChanged { authenticated }) => {
                println!("{}", if authenticated { "signed in" } else { "signed out" });
            }
            Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "dropped rendered views"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn discard(events: &mut broadcast::Receiver<ClientEvent>) {
    while !matches!(
        events.try_recv(),
        Err(TryRecvError::Empty | TryRecvError::Closed)
    ) {}
}

fn report(outcome: anyhow::Result<()>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(err) => {
            print_error(&err);
            false
        }
    }
}

fn print_error(err: &dyn std::fmt::Display) {
    println!("error: {err:#}");
}

/// Splits a shell line on whitespace, keeping quoted runs together.
fn split_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    let mut in_word = false;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
