//! Discord message builders for command replies.

use serenity::all::{CreateEmbed, CreateMessage};

use crate::diagnostics::{PermissionReport, REPORT_TITLE};

const REPORT_COLOR: u32 = 0x00FF_00;

/// Creates the permission report embed.
pub fn create_permission_report_embed(report: &PermissionReport) -> CreateEmbed {
    CreateEmbed::new()
        .title(REPORT_TITLE)
        .color(REPORT_COLOR)
        .fields(
            report
                .fields()
                .into_iter()
                .map(|(name, value)| (name, value, true)),
        )
}

/// Creates a reply carrying the permission report.
pub fn create_permission_report_message(report: &PermissionReport) -> CreateMessage {
    CreateMessage::new().embed(create_permission_report_embed(report))
}

/// Creates a plain text direct message.
pub fn create_text_message(text: &str) -> CreateMessage {
    CreateMessage::new().content(text)
}
