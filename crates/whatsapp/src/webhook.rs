use serde::Deserialize;

/// Inbound delivery payload. The platform nests messages several levels deep;
/// every level defaults to empty so that status updates and other non-message
/// deliveries deserialize cleanly instead of erroring.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub text: Option<TextBody>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

/// Sender id plus message text, the only inbound data the pipeline consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundTextMessage {
    pub from: String,
    pub body: String,
}

/// First text message in the delivery, if any. `None` covers status updates,
/// media messages, and structurally empty payloads - all acknowledged and
/// ignored by the boundary.
pub fn first_text_message(payload: &WebhookPayload) -> Option<InboundTextMessage> {
    payload
        .entry
        .iter()
        .flat_map(|entry| &entry.changes)
        .flat_map(|change| &change.value.messages)
        .find_map(|message| {
            let text = message.text.as_ref()?;
            if message.from.is_empty() {
                return None;
            }
            Some(InboundTextMessage { from: message.from.clone(), body: text.body.clone() })
        })
}
