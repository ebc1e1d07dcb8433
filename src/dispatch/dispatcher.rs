//! Command execution and event hoisting.

use super::types::{BatchResponse, BatchStatus, CommandRequest, RequestContext};
use crate::error::{HubError, Result};
use crate::events::Event;
use crate::hub::Hub;
use crate::subscriptions::ReplayRequest;
use crate::types::{MessageId, MessageKey};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

/// Result of one command before hoisting. `events: Some(..)` marks
/// commands whose result carries an event stream; after hoisting, the
/// response keeps an emptied `events` array in its place.
struct CommandOutcome {
    response: serde_json::Value,
    events: Option<Vec<Event>>,
}

#[derive(Deserialize)]
struct SendMessageArgs {
    subject: String,
    message: serde_json::Value,
    key: Option<String>,
}

#[derive(Deserialize)]
struct SubscribeArgs {
    subject: String,
    #[serde(default)]
    messages: usize,
    last_id: Option<u64>,
    #[serde(default)]
    keys: Vec<String>,
}

#[derive(Deserialize)]
struct UnsubscribeArgs {
    subject: String,
}

/// Execute a batch sequentially, hoisting events across commands.
///
/// An unknown command or invalid argument aborts the remainder of the
/// batch; commands already executed keep their effects and responses.
pub fn run_batch(hub: &Hub, ctx: &RequestContext, commands: &[CommandRequest]) -> BatchResponse {
    let mut responses = Vec::with_capacity(commands.len());
    let mut events = Vec::new();

    for request in commands {
        match run_command(hub, ctx, request) {
            Ok(outcome) => {
                let mut response = outcome.response;
                if let Some(hoisted) = outcome.events {
                    events.extend(hoisted);
                    if let Some(object) = response.as_object_mut() {
                        object.insert("events".to_string(), json!([]));
                    }
                }
                responses.push(response);
            }
            Err(err) => {
                tracing::debug!(command = %request.command, error = %err, "batch aborted");
                return BatchResponse {
                    status: BatchStatus::Error,
                    responses,
                    events,
                    error: Some(err.to_string()),
                };
            }
        }
    }

    BatchResponse {
        status: BatchStatus::Ok,
        responses,
        events,
        error: None,
    }
}

fn run_command(hub: &Hub, ctx: &RequestContext, request: &CommandRequest) -> Result<CommandOutcome> {
    match request.command.as_str() {
        "createChannel" => create_channel(hub, ctx),
        "sendMessage" => send_message(hub, ctx, parse("sendMessage", &request.arguments)?),
        "subscribe" => subscribe(hub, ctx, parse("subscribe", &request.arguments)?),
        "unsubscribe" => unsubscribe(hub, ctx, parse("unsubscribe", &request.arguments)?),
        other => Err(HubError::UnknownCommand(other.to_string())),
    }
}

fn parse<T: DeserializeOwned>(command: &'static str, arguments: &serde_json::Value) -> Result<T> {
    serde_json::from_value(arguments.clone()).map_err(|e| HubError::InvalidArgument {
        command,
        reason: e.to_string(),
    })
}

fn create_channel(hub: &Hub, ctx: &RequestContext) -> Result<CommandOutcome> {
    let (grant, events) = hub.create_channel(ctx.client, ctx.google_user.as_deref())?;
    Ok(CommandOutcome {
        response: serde_json::to_value(&grant)?,
        events: Some(events),
    })
}

fn send_message(hub: &Hub, ctx: &RequestContext, args: SendMessageArgs) -> Result<CommandOutcome> {
    hub.send_message(
        &ctx.namespace,
        &args.subject,
        ctx.client,
        args.message,
        args.key.map(MessageKey::new),
    )?;
    Ok(CommandOutcome {
        response: json!({}),
        events: None,
    })
}

fn subscribe(hub: &Hub, ctx: &RequestContext, args: SubscribeArgs) -> Result<CommandOutcome> {
    let replay = match args.last_id {
        Some(id) => ReplayRequest::Since(MessageId(id)),
        None => ReplayRequest::Recent(args.messages),
    };

    let mut events: Vec<Event> = hub
        .subscribe(&ctx.namespace, &args.subject, ctx.client, replay)?
        .iter()
        .map(Event::message)
        .collect();

    // Explicitly requested keys resolve after the replay, in the order
    // given; unknown keys are skipped.
    for key in &args.keys {
        if let Some(message) = hub.get_key(&ctx.namespace, &MessageKey::new(key.clone())) {
            events.push(Event::message(&message));
        }
    }

    Ok(CommandOutcome {
        response: json!({}),
        events: Some(events),
    })
}

fn unsubscribe(hub: &Hub, ctx: &RequestContext, args: UnsubscribeArgs) -> Result<CommandOutcome> {
    hub.unsubscribe(&ctx.namespace, &args.subject, ctx.client)?;
    Ok(CommandOutcome {
        response: json!({}),
        events: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{Hub, HubConfig};
    use crate::types::Namespace;

    fn test_hub() -> (Hub, RequestContext) {
        let hub = Hub::new(HubConfig::default());
        let profile = hub.create_profile(None);
        let client = hub
            .create_client(Namespace::new("test"), profile.id)
            .unwrap();
        let ctx = RequestContext::new(Namespace::new("test"), client.id);
        (hub, ctx)
    }

    #[test]
    fn test_unknown_command_aborts() {
        let (hub, ctx) = test_hub();

        let batch = run_batch(
            &hub,
            &ctx,
            &[
                CommandRequest::new("sendMessage", json!({"subject": "s", "message": "m"})),
                CommandRequest::new("nonsense", json!({})),
                CommandRequest::new("sendMessage", json!({"subject": "s", "message": "m2"})),
            ],
        );

        assert_eq!(batch.status, BatchStatus::Error);
        assert_eq!(batch.responses.len(), 1);
        assert!(batch.error.unwrap().contains("nonsense"));
        // The first command's effect is retained; the third never ran.
        let subject = hub.subjects().get(&ctx.namespace, "s").unwrap();
        assert_eq!(subject.log().len(), 1);
    }

    #[test]
    fn test_missing_argument_is_validation_error() {
        let (hub, ctx) = test_hub();

        let batch = run_batch(
            &hub,
            &ctx,
            &[CommandRequest::new("subscribe", json!({"messages": 3}))],
        );

        assert_eq!(batch.status, BatchStatus::Error);
        assert!(batch.responses.is_empty());
        assert!(batch.error.unwrap().contains("subscribe"));
    }

    #[test]
    fn test_subscribe_response_keeps_emptied_events() {
        let (hub, ctx) = test_hub();

        let batch = run_batch(
            &hub,
            &ctx,
            &[CommandRequest::new("subscribe", json!({"subject": "s"}))],
        );

        assert_eq!(batch.status, BatchStatus::Ok);
        assert_eq!(batch.responses[0], json!({"events": []}));
        assert!(batch.events.is_empty());
    }
}
