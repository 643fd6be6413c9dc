// course-chat
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::env;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use course_chat_core::domain::connection::models::Credentials;
use course_chat_core::domain::messaging::models::{
    DeliveryStatus, Message, MessageDraft, Sender, SenderRole,
};
use course_chat_core::{ChatClient, ClientDelegate, ClientEvent, ServerEndpoints};

struct Delegate {}

impl ClientDelegate for Delegate {
    fn handle_event(&self, client: ChatClient, event: ClientEvent) {
        match event {
            ClientEvent::ConnectionStatusChanged { status, error } => match error {
                Some(error) => println!("* {status} ({error})"),
                None => println!("* {status}"),
            },
            ClientEvent::FeedChanged { .. } => {
                let feed = client.thread.feed();
                if let Some(message) = feed.messages.last() {
                    println!("{}", format_message(message));
                }
            }
            ClientEvent::PresenceChanged { payload, .. } => println!("* presence {payload}"),
        }
    }
}

fn format_message(message: &Message) -> String {
    let marker = match message.delivery_status {
        DeliveryStatus::Pending => " …",
        DeliveryStatus::Confirmed => "",
        DeliveryStatus::Error => " !",
    };
    let key = message
        .key()
        .map(|key| key.to_string())
        .unwrap_or_default();
    let body = message
        .content
        .clone()
        .or_else(|| message.attachment.as_ref().map(|a| a.url.to_string()))
        .unwrap_or_default();

    format!(
        "[{}] {:<16} {}{}  ({})",
        message.created_at.format("%H:%M:%S"),
        message.sender.name.as_deref().unwrap_or(message.sender.id.as_str()),
        body,
        marker,
        key
    )
}

fn env_var(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("Missing environment variable {name}."))
}

fn load_credentials() -> Result<Credentials> {
    let user = Sender {
        id: env_var("CHAT_USER_ID")?.into(),
        role: SenderRole::Student,
        name: env::var("CHAT_USER_NAME").ok(),
        avatar: None,
    };
    Ok(Credentials::new(user, env_var("CHAT_ACCESS_TOKEN")?))
}

fn print_help() {
    println!("Type a message and press enter to send it. Commands:");
    println!("  /older                  load older messages");
    println!("  /edit <id> <text>       edit one of your messages");
    println!("  /delete <id>            delete one of your messages");
    println!("  /retry <temp-id>        resend a failed message");
    println!("  /discard <temp-id>      drop a failed message");
    println!("  /switch <course-id>     open another course");
    println!("  /reconnect              reconnect the push channel");
    println!("  /feed                   print the whole feed");
    println!("  /quit");
}

async fn run_command(client: &ChatClient, line: &str) -> Result<bool> {
    let mut parts = line.splitn(3, ' ');
    let command = parts.next().unwrap_or_default();
    let first = parts.next();
    let rest = parts.next();

    match (command, first, rest) {
        ("/quit", _, _) => return Ok(false),
        ("/help", _, _) => print_help(),
        ("/older", _, _) => println!("{:?}", client.thread.load_older().await?),
        ("/edit", Some(id), Some(text)) => client.thread.edit(&id.into(), text).await?,
        ("/delete", Some(id), _) => client.thread.delete(&id.into()).await?,
        ("/retry", Some(temp_id), _) => {
            client.thread.retry(&temp_id.into())?;
        }
        ("/discard", Some(temp_id), _) => client.thread.discard_failed(&temp_id.into())?,
        ("/switch", Some(course_id), _) => client.thread.switch_course(course_id.into()).await?,
        ("/reconnect", _, _) => client.thread.reconnect().await?,
        ("/feed", _, _) => {
            for message in client.thread.feed().messages.iter() {
                println!("{}", format_message(message));
            }
        }
        _ if line.starts_with('/') => print_help(),
        _ => {
            client.thread.submit(MessageDraft::text(line))?;
        }
    }

    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let endpoints = ServerEndpoints {
        websocket_url: Url::parse(&env_var("CHAT_WEBSOCKET_URL")?)?,
        api_base_url: Url::parse(&env_var("CHAT_API_URL")?)?,
    };

    let client = ChatClient::builder()
        .set_endpoints(endpoints)
        .set_delegate(Some(Box::new(Delegate {})))
        .build();

    let course_id = env_var("CHAT_COURSE_ID")?;
    info!("Opening course {course_id}…");
    client
        .open_course(course_id.into(), load_credentials()?)
        .await?;

    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match run_command(&client, line).await {
            Ok(true) => (),
            Ok(false) => break,
            Err(err) => println!("! {err}"),
        }
    }

    client.close();
    Ok(())
}
