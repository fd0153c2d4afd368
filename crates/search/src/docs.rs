use atlas_model::Node;

/// Assemble the searchable text for one node: name, path, signature,
/// doc metadata, summary when present, and the bounded excerpt. Degraded
/// nodes simply contribute fewer sections; they always produce a document.
#[must_use]
pub fn document_text(node: &Node) -> String {
    let mut parts: Vec<String> = vec![node.name.clone(), node.path.clone()];
    if let Some(signature) = &node.signature {
        parts.push(signature.clone());
    }
    if let Some(doc) = &node.doc {
        for param in &doc.params {
            parts.push(param.name.clone());
            if let Some(annotation) = &param.annotation {
                parts.push(annotation.clone());
            }
        }
        if let Some(returns) = &doc.returns {
            parts.push(returns.clone());
        }
        parts.extend(doc.raises.iter().cloned());
        parts.extend(doc.decorators.iter().cloned());
        if let Some(owner) = &doc.owner {
            parts.push(owner.clone());
        }
    }
    if let Some(summary) = &node.summary {
        parts.push(summary.clone());
    }
    if !node.excerpt.is_empty() {
        parts.push(node.excerpt.clone());
    }
    parts.join("\n")
}
