//! Response codec - document form と transport form
//!
//! 2 種類のエンコードを明示的に分けています。
//! - **document form**: 人間も読める整形済み XML テキスト（`encode_document`）
//! - **transport form**: broker に載せる不透明なバイト列（JSON、`encode_for_transport`）
//!
//! どちらを使うかは handler ごとに明示的に選びます（型からは推論しない）。

use std::sync::Arc;

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{Element, PendingDecision, StructuredError};

pub const ERROR_ROOT: &str = "Error";
pub const APPROVAL_LIST_ROOT: &str = "choicesAvailableForUnits";

const INDENT_WIDTH: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document: {0}")]
    Document(#[from] quick_xml::Error),

    #[error("document is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// `<Error><code>..</code><details>..</details></Error>`
pub fn build_error(error: &StructuredError) -> Element {
    Element::new(ERROR_ROOT)
        .with_child(Element::text_node("code", error.code.as_str()))
        .with_child(Element::text_node("details", error.details.as_str()))
}

/// Root `choicesAvailableForUnits` with one child per decision, in order.
pub fn build_approval_list(decisions: &[Arc<dyn PendingDecision>]) -> Element {
    decisions
        .iter()
        .fold(Element::new(APPROVAL_LIST_ROOT), |root, decision| {
            root.with_child(decision.to_element())
        })
}

/// Pretty-printed XML text. Output depends only on the element tree.
pub fn encode_document(root: &Element) -> Result<String, CodecError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
    write_element(&mut writer, root)?;
    let mut text = String::from_utf8(writer.into_inner())?;
    text.push('\n');
    Ok(text)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), CodecError> {
    let mut start = BytesStart::new(element.name());
    for (key, value) in element.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = element.text() {
        // only `<`, `>` and `&` are escaped in text content
        writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    }
    for child in element.children() {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name())))?;
    Ok(())
}

/// Opaque payload bytes for the broker.
pub fn encode_for_transport<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode_from_transport<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Client-side reading of a `getJobsAwaitingApproval` reply.
///
/// Success replies are transport-wrapped document text; lock errors arrive
/// as bare document text; a failed handler answers with nothing.
pub fn decode_listing_reply(bytes: &[u8]) -> Result<Option<String>, CodecError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    match decode_from_transport::<String>(bytes) {
        Ok(document) => Ok(Some(document)),
        Err(_) => Ok(Some(String::from_utf8(bytes.to_vec())?)),
    }
}
