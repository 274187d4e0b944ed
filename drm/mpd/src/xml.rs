use sxd_document::Package;
use sxd_document::dom::{Document, Element};
use sxd_xpath::nodeset::Node;

use crate::error::ExtractError;

/**
    Parse manifest text into an XML package, ignoring a leading byte order mark.
*/
pub fn parse_document(xml: &str) -> Result<Package, ExtractError> {
    let xml = xml.trim_start_matches('\u{feff}');
    sxd_document::parser::parse(xml).map_err(|e| ExtractError::Parse(format!("{e:?}")))
}

/**
    Elements selected by `xpath`, in document order. Non-element nodes in
    the result are dropped.
*/
pub fn select_elements<'d>(
    document: &Document<'d>,
    xpath: &str,
) -> Result<Vec<Element<'d>>, ExtractError> {
    let factory = sxd_xpath::Factory::new();
    let xpath = factory
        .build(xpath)
        .map_err(|e| ExtractError::Parse(format!("invalid XPath: {e:?}")))?
        .ok_or_else(|| ExtractError::Parse("empty XPath".into()))?;

    let context = sxd_xpath::Context::new();
    let value = xpath
        .evaluate(&context, document.root())
        .map_err(|e| ExtractError::Parse(format!("XPath evaluation failed: {e:?}")))?;

    let elements = match value {
        sxd_xpath::Value::Nodeset(nodes) => nodes
            .document_order()
            .into_iter()
            .filter_map(|node| match node {
                Node::Element(element) => Some(element),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(elements)
}
