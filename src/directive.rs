use serde_json::Value;

/// A tool invocation extracted from a model reply.
///
/// `params` is always a JSON object by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDirective {
    pub name: String,
    pub params: Value,
}

/// Outcome of scanning one model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveScan {
    /// Both marker lines found and the payload parsed as a JSON object.
    Directive(ToolDirective),
    /// No directive present (or one half of it empty): the reply is plain
    /// guidance and dispatch is skipped silently.
    NoDirective,
    /// Both markers present but the payload is unusable; the reason is
    /// reported to the operator and the turn continues.
    Malformed(String),
}

/// Scan a reply for the two-line `TOOL:`/`PARAMS:` directive.
///
/// The reply is considered directive-bearing only when both literal markers
/// occur somewhere in the text. The tool name is the remainder of the first
/// line starting with `TOOL:`; the payload is the remainder of the first
/// line starting with `PARAMS:`. Anything the model wrote around those two
/// lines is ignored.
pub fn scan_reply(reply: &str) -> DirectiveScan {
    if !reply.contains("TOOL:") || !reply.contains("PARAMS:") {
        return DirectiveScan::NoDirective;
    }

    let mut name: Option<&str> = None;
    let mut payload: Option<&str> = None;
    for line in reply.lines() {
        if name.is_none() {
            if let Some(rest) = line.strip_prefix("TOOL:") {
                name = Some(rest.trim());
                continue;
            }
        }
        if payload.is_none() {
            if let Some(rest) = line.strip_prefix("PARAMS:") {
                payload = Some(rest.trim());
            }
        }
    }

    let (Some(name), Some(payload)) = (name, payload) else {
        return DirectiveScan::NoDirective;
    };
    if name.is_empty() || payload.is_empty() {
        return DirectiveScan::NoDirective;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(params @ Value::Object(_)) => DirectiveScan::Directive(ToolDirective {
            name: name.to_string(),
            params,
        }),
        Ok(other) => DirectiveScan::Malformed(format!(
            "PARAMS must be a JSON object, got: {other}"
        )),
        Err(err) => DirectiveScan::Malformed(format!("invalid PARAMS JSON: {err}")),
    }
}
