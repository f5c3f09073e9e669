use anyhow::Context;
use client::{ListQuery, ResourceBackend, ResourceSession};
use serde_json::{Value, json};
use workflow::{Action, ActorId, ResourceId, visible_statuses};

use crate::Command;

pub(crate) async fn run<B: ResourceBackend>(
    session: &ResourceSession<B>,
    command: Command,
) -> anyhow::Result<Value> {
    let value = match command {
        Command::Whoami => json!({
            "id": session.actor().id(),
            "role": session.actor().role().as_str(),
            "permissions": session.permissions(),
            "visible_statuses": visible_statuses(session.actor()),
        }),
        Command::List {
            status,
            owner,
            page,
            per_page,
            sort,
            order,
        } => {
            let query = ListQuery {
                status,
                owner: owner.map(ActorId::from),
                page,
                per_page,
                sort: sort.into(),
                order: order.into(),
            };
            let page = session.load_page(&query).await?;
            json!({
                "items": page.items,
                "page": page.page,
                "per_page": page.per_page,
                "total": page.total,
                "total_pages": page.total_pages(),
            })
        }
        Command::Show { id } => serde_json::to_value(session.load(&id.into()).await?)?,
        Command::Actions { id } => {
            let actions = session.available_actions(&id.into()).await?;
            serde_json::to_value(actions)?
        }
        Command::Submit { id } => transition(session, id, Action::Submit, None).await?,
        Command::Approve { id, comment } => {
            transition(session, id, Action::Approve, comment).await?
        }
        Command::Reject { id, comment } => {
            transition(session, id, Action::Reject, Some(comment)).await?
        }
        Command::Deactivate { id, comment } => {
            transition(session, id, Action::Deactivate, Some(comment)).await?
        }
        Command::Reactivate { id, comment } => {
            transition(session, id, Action::Reactivate, comment).await?
        }
        Command::Resubmit { id } => transition(session, id, Action::Resubmit, None).await?,
        Command::Rate { id, value } => {
            let resource = session
                .rate(&id.clone().into(), value)
                .await
                .with_context(|| format!("Failed to rate {id}"))?;
            serde_json::to_value(resource)?
        }
        Command::Delete { id } => {
            session
                .delete(&id.clone().into())
                .await
                .with_context(|| format!("Failed to delete {id}"))?;
            json!({ "deleted": id })
        }
    };
    Ok(value)
}

async fn transition<B: ResourceBackend>(
    session: &ResourceSession<B>,
    id: String,
    action: Action,
    comment: Option<String>,
) -> anyhow::Result<Value> {
    let resource_id = ResourceId::from(id.as_str());
    let resource = session
        .transition(&resource_id, action, comment.as_deref())
        .await
        .with_context(|| format!("Failed to {action} {id}"))?;
    Ok(serde_json::to_value(resource)?)
}
