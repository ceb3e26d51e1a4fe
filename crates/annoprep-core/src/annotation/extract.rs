//! Entity and relation extraction from annotation results.

use tracing::{debug, info};

use super::record::{Example, ResultItem, ResultValue};
use super::tokens::{TokenSpan, spans_are_exact, whitespace_spans};
use crate::error::{AnnoprepError, Result};

/// A labelled span after whitespace trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAnnotation {
    /// Trimmed surface text.
    pub text: String,
    /// Start character offset of the trimmed text.
    pub start: usize,
    /// End character offset (exclusive) of the trimmed text.
    pub end: usize,
    /// First label of the annotation.
    pub label: String,
    /// Result item identifier, referenced by relations.
    pub id: String,
}

/// A directed edge between two entity identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationAnnotation {
    pub from_id: String,
    pub to_id: String,
}

/// Classified result item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultKind {
    Entity(EntityAnnotation),
    Relation(RelationAnnotation),
}

/// One retained example: its text, token spans, entities and relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedText {
    pub text: String,
    pub tokens: Vec<TokenSpan>,
    pub entities: Vec<EntityAnnotation>,
    pub relations: Vec<RelationAnnotation>,
}

impl AnnotatedText {
    /// Creates an example with token spans and no annotations.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = whitespace_spans(&text);
        Self {
            text,
            tokens,
            entities: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Entities ordered by start offset; ties keep annotation order.
    pub fn sorted_entities(&self) -> Vec<&EntityAnnotation> {
        let mut entities: Vec<&EntityAnnotation> = self.entities.iter().collect();
        entities.sort_by_key(|e| e.start);
        entities
    }

    /// Returns `true` if the token spans match the text exactly.
    pub fn tokens_are_exact(&self) -> bool {
        spans_are_exact(&self.text, &self.tokens)
    }
}

impl EntityAnnotation {
    /// Builds an entity from a span payload, trimming the surface text and
    /// moving the offsets onto the trimmed text.
    ///
    /// Multi-label spans keep only their first label.
    pub fn from_value(value: &ResultValue, id: &str, index: usize) -> Result<Self> {
        let raw = value
            .text
            .as_deref()
            .ok_or_else(|| AnnoprepError::malformed(index, "entity without text"))?;
        let start = value
            .start
            .ok_or_else(|| AnnoprepError::malformed(index, "entity without start"))?;
        let label = value.first_label().ok_or_else(|| {
            AnnoprepError::malformed(index, format!("entity {id:?} has no labels"))
        })?;

        let leading = raw.chars().count() - raw.trim_start().chars().count();
        let trimmed = raw.trim();
        let start = start + leading;
        let end = start + trimmed.chars().count();

        Ok(Self {
            text: trimmed.to_string(),
            start,
            end,
            label: label.to_string(),
            id: id.to_string(),
        })
    }
}

impl ResultItem {
    /// Items with a `value` payload are entities, the rest are relations.
    ///
    /// # Errors
    ///
    /// Returns `AnnoprepError::MalformedExample` if the item lacks the fields
    /// its kind needs.
    pub fn classify(&self, index: usize) -> Result<ResultKind> {
        match &self.value {
            Some(value) => {
                let id = self
                    .id
                    .as_deref()
                    .ok_or_else(|| AnnoprepError::malformed(index, "entity without id"))?;
                Ok(ResultKind::Entity(EntityAnnotation::from_value(value, id, index)?))
            }
            None => match (&self.from_id, &self.to_id) {
                (Some(from_id), Some(to_id)) => Ok(ResultKind::Relation(RelationAnnotation {
                    from_id: from_id.clone(),
                    to_id: to_id.clone(),
                })),
                _ => Err(AnnoprepError::malformed(
                    index,
                    "result item is neither a span nor a relation",
                )),
            },
        }
    }
}

/// Extracts entities and relations from every example annotated exactly once.
///
/// Examples whose `total_annotations` is anything other than 1 are skipped.
///
/// # Errors
///
/// Returns `AnnoprepError::MalformedExample` for the first retained example
/// that does not have the expected shape, naming its task id when the export
/// has one.
pub fn extract_annotations(
    examples: &[Example],
    field_name: &str,
) -> Result<Vec<AnnotatedText>> {
    let mut annotated = Vec::new();
    let mut skipped = 0usize;

    for (index, example) in examples.iter().enumerate() {
        if example.total_annotations != Some(1) {
            debug!(index, total = ?example.total_annotations, "skipping example");
            skipped += 1;
            continue;
        }

        let info =
            annotate(example, field_name, index).map_err(|e| e.with_task_id(example.task_id()))?;
        annotated.push(info);
    }

    info!(kept = annotated.len(), skipped, "extracted annotations");
    Ok(annotated)
}

fn annotate(example: &Example, field_name: &str, index: usize) -> Result<AnnotatedText> {
    let mut info = AnnotatedText::new(example.text(field_name, index)?);
    if !info.tokens_are_exact() {
        debug!(index, "token spans drift from text (irregular whitespace)");
    }

    for item in example.first_result(index)? {
        match item.classify(index)? {
            ResultKind::Entity(entity) => info.entities.push(entity),
            ResultKind::Relation(relation) => info.relations.push(relation),
        }
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::record::read_examples;

    fn export(items: &str, total: u64) -> String {
        format!(
            r#"[{{"data": {{"text": "  Alice met Bob in Paris"}}, "total_annotations": {total},
                "annotations": [{{"result": [{items}]}}]}}]"#
        )
    }

    #[test]
    fn skips_examples_not_annotated_exactly_once() {
        let json = r#"[
            {"data": {"text": "a"}, "total_annotations": 0, "annotations": []},
            {"data": {"text": "b"}, "total_annotations": 2, "annotations": [{"result": []}, {"result": []}]},
            {"data": {"text": "c"}, "total_annotations": 1, "annotations": [{"result": []}]},
            {"data": {"text": "d"}, "annotations": [{"result": []}]}
        ]"#;
        let examples = read_examples(json.as_bytes()).unwrap();
        let annotated = extract_annotations(&examples, "text").unwrap();

        assert_eq!(annotated.len(), 1);
        assert_eq!(annotated[0].text, "c");
    }

    #[test]
    fn trims_span_and_moves_offsets() {
        // "  Alice met Bob in Paris": "Bob" sits at 12..15
        let items = r#"{"id": "e1", "value": {"text": "  Bob ", "start": 10, "labels": ["PER"]}}"#;
        let examples = read_examples(export(items, 1).as_bytes()).unwrap();
        let annotated = extract_annotations(&examples, "text").unwrap();

        let entity = &annotated[0].entities[0];
        assert_eq!(entity.text, "Bob");
        assert_eq!((entity.start, entity.end), (12, 15));

        let chars: Vec<char> = annotated[0].text.chars().collect();
        let span: String = chars[entity.start..entity.end].iter().collect();
        assert_eq!(span, entity.text);
    }

    #[test]
    fn keeps_only_first_label() {
        let items = r#"{"id": "e1", "value": {"text": "Paris", "start": 19, "labels": ["LOC", "GPE"]}}"#;
        let examples = read_examples(export(items, 1).as_bytes()).unwrap();
        let annotated = extract_annotations(&examples, "text").unwrap();

        assert_eq!(annotated[0].entities[0].label, "LOC");
    }

    #[test]
    fn collects_relations() {
        let items = r#"
            {"id": "e1", "value": {"text": "Alice", "start": 2, "labels": ["PER"]}},
            {"id": "e2", "value": {"text": "Bob", "start": 12, "labels": ["PER"]}},
            {"type": "relation", "from_id": "e1", "to_id": "e2"}
        "#;
        let examples = read_examples(export(items, 1).as_bytes()).unwrap();
        let annotated = extract_annotations(&examples, "text").unwrap();

        assert_eq!(annotated[0].entities.len(), 2);
        assert_eq!(
            annotated[0].relations,
            vec![RelationAnnotation {
                from_id: "e1".into(),
                to_id: "e2".into()
            }]
        );
    }

    #[test]
    fn empty_labels_is_an_error() {
        let items = r#"{"id": "e1", "value": {"text": "Bob", "start": 12, "labels": []}}"#;
        let examples = read_examples(export(items, 1).as_bytes()).unwrap();
        let err = extract_annotations(&examples, "text").unwrap_err();
        assert!(matches!(err, AnnoprepError::MalformedExample { index: 0, .. }));
    }

    #[test]
    fn malformed_error_names_task_id() {
        let json = r#"[{"id": 4242, "data": {"text": "Bob"}, "total_annotations": 1,
            "annotations": [{"result": [{"id": "e1", "value": {"text": "Bob", "start": 0, "labels": []}}]}]}]"#;
        let examples = read_examples(json.as_bytes()).unwrap();
        let err = extract_annotations(&examples, "text").unwrap_err();

        assert!(matches!(
            &err,
            AnnoprepError::MalformedExample { index: 0, task_id: Some(id), .. } if id == "4242"
        ));
        assert!(err.to_string().contains("4242"));
        assert!(err.to_string().contains("\"e1\""));
    }

    #[test]
    fn missing_field_error_names_string_task_id() {
        let json = r#"[{"id": "task-9", "data": {}, "total_annotations": 1, "annotations": [{"result": []}]}]"#;
        let examples = read_examples(json.as_bytes()).unwrap();
        let err = extract_annotations(&examples, "text").unwrap_err();
        assert!(err.to_string().contains("(id task-9)"));
    }

    #[test]
    fn dangling_relation_item_is_an_error() {
        let items = r#"{"from_id": "e1"}"#;
        let examples = read_examples(export(items, 1).as_bytes()).unwrap();
        assert!(extract_annotations(&examples, "text").is_err());
    }

    #[test]
    fn malformed_skipped_example_is_ignored() {
        let json = r#"[{"data": {}, "total_annotations": 3}]"#;
        let examples = read_examples(json.as_bytes()).unwrap();
        assert!(extract_annotations(&examples, "text").unwrap().is_empty());
    }

    #[test]
    fn sorted_entities_is_stable() {
        let mut info = AnnotatedText::new("x y");
        for (id, start) in [("a", 2), ("b", 0), ("c", 2)] {
            info.entities.push(EntityAnnotation {
                text: "x".into(),
                start,
                end: start + 1,
                label: id.to_uppercase(),
                id: id.into(),
            });
        }
        let ids: Vec<&str> = info.sorted_entities().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
