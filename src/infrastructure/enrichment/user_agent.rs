//! User-agent classification with `woothee`.

use woothee::parser::Parser;

use crate::domain::enrichment::{ClientInfo, UserAgentParser};

pub const DEVICE_MOBILE: &str = "mobile";
pub const DEVICE_DESKTOP: &str = "desktop";
pub const DEVICE_UNKNOWN: &str = "unknown";

/// Classifies user agents into browser, OS and a coarse device type.
///
/// Device types: `mobile` for smartphones and feature phones, `unknown` for
/// crawlers and unrecognised agents, `desktop` for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct WootheeParser;

fn known(value: &str) -> String {
    if value.is_empty() || value == "UNKNOWN" {
        String::new()
    } else {
        value.to_string()
    }
}

impl UserAgentParser for WootheeParser {
    fn parse(&self, user_agent: &str) -> ClientInfo {
        let unknown = ClientInfo {
            device_type: DEVICE_UNKNOWN.to_string(),
            ..Default::default()
        };

        if user_agent.trim().is_empty() {
            return unknown;
        }

        let Some(result) = Parser::new().parse(user_agent) else {
            return unknown;
        };

        let category: &str = &result.category;
        let device_type = match category {
            "smartphone" | "mobilephone" => DEVICE_MOBILE,
            "crawler" | "UNKNOWN" | "" => DEVICE_UNKNOWN,
            _ => DEVICE_DESKTOP,
        };

        ClientInfo {
            browser: known(&result.name),
            os: known(&result.os),
            device_type: device_type.to_string(),
        }
    }
}
