// Bot command parsing, dispatch and reply formatting.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::auth::CallerId;
use crate::clock::Clock;
use crate::controller::{StatusController, StatusView};
use crate::error::ControllerError;
use crate::hours::OperatingHours;
use crate::metrics;
use crate::status::CourtStatus;

pub const NOT_AUTHORIZED: &str = "Sorry, you're not authorized to use this bot.";

const HOURS_USAGE: &str = "Please send hours as OPEN-CLOSE, e.g. 7-19 (for 7 AM to 7 PM).\n\
Hours must be 0-23 and opening must be before closing.";

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Status,
    Set(CourtStatus),
    Auto,
    Notes(String),
    ClearNotes,
    Hours(String),
    HoursToday(String),
    Unknown(String),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Status => "status",
            Command::Set(_) => "set",
            Command::Auto => "auto",
            Command::Notes(_) => "notes",
            Command::ClearNotes => "clear_notes",
            Command::Hours(_) => "hours",
            Command::HoursToday(_) => "hours_today",
            Command::Unknown(_) => "unknown",
        }
    }
}

/// Parse `/cmd[@botname] [args]`. Returns `None` if the text is not a command.
pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim().strip_prefix('/')?;
    let (head, args) = match text.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim().to_string()),
        None => (text, String::new()),
    };
    let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

    let command = match name.as_str() {
        "start" | "help" => Command::Start,
        "status" => Command::Status,
        "open" => Command::Set(CourtStatus::Open),
        "closed" | "close" => Command::Set(CourtStatus::Closed),
        "critical_open" => Command::Set(CourtStatus::CriticallyOpen),
        "critical_closed" => Command::Set(CourtStatus::CriticallyClosed),
        "auto" => Command::Auto,
        "notes" => Command::Notes(args),
        "clear_notes" => Command::ClearNotes,
        "hours" | "change_hours" => Command::Hours(args),
        "hours_today" => Command::HoursToday(args),
        _ => Command::Unknown(name),
    };
    Some(command)
}

/// Run `command` for `caller` and produce the reply text.
pub fn handle_command(
    command: Command,
    caller: &CallerId,
    controller: &StatusController,
    clock: &dyn Clock,
) -> String {
    metrics::BOT_COMMANDS_TOTAL
        .with_label_values(&[command.name()])
        .inc();
    let now = clock.now();

    let result = match command {
        Command::Start => Ok(welcome_message(&controller.snapshot(now.date_naive()))),
        Command::Status => Ok(status_message(&controller.snapshot(now.date_naive()))),
        Command::Set(status) => controller
            .set_manual_status(caller, status, now)
            .map(|s| format!("{} Courts set to {}", s.icon(), s.label())),
        Command::Auto => controller.resume_automatic(caller).map(|_| {
            "🤖 Automatic mode resumed. Status updates on the next weather check.".to_string()
        }),
        Command::Notes(text) if text.is_empty() => {
            Ok("📝 Usage: /notes <text>".to_string())
        }
        Command::Notes(text) => controller
            .set_notes(caller, &text, now)
            .map(|()| format!("✅ Notes added: {}", escape_markdown(&text))),
        Command::ClearNotes => controller
            .clear_notes(caller, now)
            .map(|()| "🗑️ Status notes cleared".to_string()),
        Command::Hours(text) => change_hours(controller, caller, &text, now, false),
        Command::HoursToday(text) => change_hours(controller, caller, &text, now, true),
        Command::Unknown(name) => Ok(format!(
            "Unknown command /{}. Send /help for the command list.",
            escape_markdown(&name)
        )),
    };

    match result {
        Ok(reply) => reply,
        Err(ControllerError::Unauthorized) => NOT_AUTHORIZED.to_string(),
        Err(ControllerError::InvalidHours(e)) => {
            format!("❌ {}\n{HOURS_USAGE}", escape_markdown(&e.to_string()))
        }
    }
}

fn change_hours(
    controller: &StatusController,
    caller: &CallerId,
    text: &str,
    now: DateTime<FixedOffset>,
    today_only: bool,
) -> Result<String, ControllerError> {
    controller.authorize(caller)?;
    if text.is_empty() {
        let current = controller.effective_hours(now.date_naive());
        return Ok(format!(
            "🕐 Current hours: {}\n\n{HOURS_USAGE}",
            current.display_12h()
        ));
    }
    let hours = OperatingHours::parse(text)?;
    if today_only {
        controller.set_hours_for_day(caller, now.date_naive(), hours, now)?;
        Ok(format!("✅ Hours changed for today only: {}", hours.display_12h()))
    } else {
        controller.set_hours(caller, hours, now)?;
        Ok(format!("✅ Hours permanently changed to {}", hours.display_12h()))
    }
}

// ── Formatting ───────────────────────────────────────────────────────

/// Escape characters that legacy Telegram Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Format as `August 18th, 2025 11:53:04AM`.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    let day = ts.day();
    let suffix = match (day % 10, day) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    let (is_pm, hour) = ts.hour12();
    format!(
        "{} {day}{suffix}, {} {hour}:{:02}:{:02}{}",
        ts.format("%B"),
        ts.year(),
        ts.minute(),
        ts.second(),
        if is_pm { "PM" } else { "AM" }
    )
}

pub fn welcome_message(view: &StatusView) -> String {
    format!(
        "🎾 *Tennis Courts Control Bot* 🎾\n\n\
Available commands:\n\
/status - Check current court status\n\
/open - Set courts as OPEN\n\
/closed - Set courts as CLOSED\n\
/critical\\_open - Emergency OPEN\n\
/critical\\_closed - Emergency CLOSED\n\
/auto - Resume automatic status\n\
/notes <text> - Set status notes\n\
/clear\\_notes - Clear status notes\n\
/hours OPEN-CLOSE - Change operating hours\n\
/hours\\_today OPEN-CLOSE - Change today's hours\n\n\
Current status: *{}*\n\
Last updated: {}",
        view.status.label(),
        format_timestamp(&view.last_updated)
    )
}

pub fn status_message(view: &StatusView) -> String {
    let reading = |v: Option<String>| v.unwrap_or_else(|| "n/a".to_string());
    let mut msg = format!(
        "{} *Court Status: {}*\n\n\
🌡️ Temperature: {}\n\
🌧️ Precipitation: {}\n\
🎾 Conditions: {}\n\n\
🕐 Hours: {}",
        view.status.icon(),
        view.status.label(),
        reading(view.temperature.map(|t| format!("{t}°F"))),
        reading(view.precipitation.map(|p| format!("{p}%"))),
        escape_markdown(&view.conditions),
        view.hours.display_12h(),
    );

    if !view.notes.is_empty() {
        msg.push_str(&format!("\n📝 Notes: {}", escape_markdown(&view.notes)));
    }
    if let Some(o) = view.hours_override {
        msg.push_str(&format!(
            "\n🔄 Today's hours override: {}",
            o.hours.display_12h()
        ));
    }

    msg.push_str(&format!(
        "\n\n📅 Last updated: {}\n👤 Updated by: {}\n🔧 Manual override: {}",
        format_timestamp(&view.last_updated),
        escape_markdown(&view.updated_by),
        if view.manual_override { "Yes" } else { "No" }
    ));
    msg
}
