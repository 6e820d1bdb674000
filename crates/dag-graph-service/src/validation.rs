//! Request validation for stored graphs
//!
//! Every check runs and all problems are reported together, so a client can
//! fix a document in one round trip.

use dag_engine::GraphDocument;

use crate::config::GraphServiceConfig;
use crate::error::{GraphServiceError, Result};
use crate::service::PageRequest;

/// Longest accepted graph name, in characters
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Check a document before it is stored
pub fn validate_document(document: &GraphDocument) -> Result<()> {
    let mut problems = Vec::new();

    let name_len = document.name.chars().count();
    if name_len == 0 {
        problems.push("\"name\" is not allowed to be empty".to_string());
    } else if name_len > MAX_NAME_LEN {
        problems.push(format!(
            "\"name\" length must be less than or equal to {} characters long",
            MAX_NAME_LEN
        ));
    }

    if document.description.chars().count() > MAX_DESCRIPTION_LEN {
        problems.push(format!(
            "\"description\" length must be less than or equal to {} characters long",
            MAX_DESCRIPTION_LEN
        ));
    }

    for (index, node) in document.nodes.iter().enumerate() {
        if node.id.is_empty() {
            problems.push(format!("\"nodes[{}].id\" is not allowed to be empty", index));
        }
        if node.data.label.is_empty() {
            problems.push(format!(
                "\"nodes[{}].data.label\" is not allowed to be empty",
                index
            ));
        }
    }

    for (index, edge) in document.edges.iter().enumerate() {
        for (field, value) in [
            ("id", &edge.id),
            ("source", &edge.source),
            ("target", &edge.target),
        ] {
            if value.is_empty() {
                problems.push(format!(
                    "\"edges[{}].{}\" is not allowed to be empty",
                    index, field
                ));
            }
        }
    }

    if document.tags.iter().any(String::is_empty) {
        problems.push("\"tags\" must not contain empty strings".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(GraphServiceError::Validation(problems))
    }
}

/// Check pagination bounds against the service limits
pub fn validate_page_request(request: &PageRequest, config: &GraphServiceConfig) -> Result<()> {
    let mut problems = Vec::new();

    if request.page < 1 {
        problems.push("\"page\" must be greater than or equal to 1".to_string());
    }
    let limit = request.effective_limit(config);
    if limit < 1 {
        problems.push("\"limit\" must be greater than or equal to 1".to_string());
    } else if limit > config.max_page_limit {
        problems.push(format!(
            "\"limit\" must be less than or equal to {}",
            config.max_page_limit
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(GraphServiceError::Validation(problems))
    }
}
