//! End-to-end tests for building, parsing, reading and writing document trees

mod common;

use common::{article, blog_model, comment, person, Article, Comment, Person};
use jsonapi_dom::document::{DocumentType, ErrorObject, Link, Links, Meta};
use jsonapi_dom::domain::TreeNodeConvert;
use jsonapi_dom::model::{Cardinality, ModelError};
use jsonapi_dom::{
    Document, DocumentError, DomDocument, HostDocument, RelatedOrder, ServiceModel, Settings,
};
use rstest::{fixture, rstest};
use serde_json::{json, Value};

#[fixture]
fn model() -> ServiceModel {
    blog_model()
}

fn rendered_json(document: &DomDocument) -> Value {
    let json = document.write().unwrap().to_json().unwrap();
    serde_json::from_str(&json).unwrap()
}

fn parse(model: &ServiceModel, value: Value, settings: &Settings) -> Result<DomDocument, DocumentError> {
    DomDocument::from_json(model, &value.to_string(), settings)
}

// ============================================================
// Round trip
// ============================================================

#[rstest]
fn given_article_with_included_when_round_tripping_then_host_objects_survive(model: ServiceModel) {
    // Arrange
    let settings = Settings::default();
    let mut links = Links::new();
    links.insert("self".to_string(), Link::new("http://example.com/articles/1"));
    let mut meta = Meta::new();
    meta.insert("views".to_string(), json!(42));
    let original = Article {
        links: Some(links.clone()),
        meta: Some(meta.clone()),
        ..article(1, "JSON:API paints my bikeshed!", Some(9), vec![5, 12])
    };
    let host = HostDocument::resource(original.clone())
        .with_included(person(9, "Dan"))
        .with_included(comment(5, "First!"))
        .with_included(comment(12, "I like XML better"));

    // Act
    let built = DomDocument::build(&model, host, &settings).unwrap();
    let json = built.write().unwrap().to_json().unwrap();
    let parsed = DomDocument::from_json(&model, &json, &settings).unwrap();

    // Assert
    let reader = parsed.reader();
    assert_eq!(reader.get_document_type(), DocumentType::Resource);
    let article = reader.get_resource::<Article>(false).unwrap().unwrap();
    assert_eq!(article, &original);
    assert_eq!(reader.get_resource_links_of(article).unwrap(), Some(&links));
    assert_eq!(reader.get_resource_meta_by_id::<Article, u64>(&1).unwrap(), Some(&meta));

    let relationships = reader.get_resource_relationships::<Article>().unwrap().unwrap();
    let author = reader
        .get_related_resource::<Person>(&relationships["author"])
        .unwrap();
    assert_eq!(author, Some(&person(9, "Dan")));
    let comments = reader
        .get_related_resource_collection::<Comment>(&relationships["comments"])
        .unwrap();
    assert_eq!(comments, vec![&comment(5, "First!"), &comment(12, "I like XML better")]);
}

#[rstest]
fn given_built_document_when_writing_then_wire_shape_matches(model: ServiceModel) {
    // Arrange
    let host = HostDocument::resource(article(1, "Rails is Omakase", Some(9), vec![]))
        .with_meta(Meta::from_iter([("copyright".to_string(), json!("ACME"))]));

    // Act
    let document = DomDocument::build(&model, host, &Settings::default()).unwrap();

    // Assert
    assert_eq!(
        rendered_json(&document),
        json!({
            "meta": {"copyright": "ACME"},
            "data": {
                "type": "articles",
                "id": "1",
                "attributes": {"title": "Rails is Omakase"},
                "relationships": {
                    "author": {"data": {"type": "people", "id": "9"}},
                    "comments": {"data": []}
                }
            }
        })
    );
}

#[rstest]
fn given_configured_version_when_building_then_jsonapi_member_emitted(model: ServiceModel) {
    let settings = Settings {
        jsonapi_version: Some("1.1".to_string()),
        ..Settings::default()
    };

    let document = DomDocument::build(&model, HostDocument::resource(person(9, "Dan")), &settings).unwrap();

    assert_eq!(
        document.reader().get_json_api_version().and_then(|v| v.version.as_deref()),
        Some("1.1")
    );
    assert_eq!(rendered_json(&document)["jsonapi"], json!({"version": "1.1"}));
}

#[rstest]
fn given_null_to_one_when_parsing_then_related_resource_is_none(model: ServiceModel) {
    // Arrange
    let wire = json!({
        "data": {
            "type": "articles",
            "id": "1",
            "attributes": {"title": "Orphan"},
            "relationships": {"author": {"data": null}}
        }
    });

    // Act
    let document = parse(&model, wire, &Settings::default()).unwrap();

    // Assert
    let reader = document.reader();
    let article = reader.get_resource::<Article>(false).unwrap().unwrap();
    assert_eq!(article.author_id, None);
    let relationships = reader.get_resource_relationships::<Article>().unwrap().unwrap();
    assert_eq!(reader.get_related_resource::<Person>(&relationships["author"]).unwrap(), None);
}

// ============================================================
// Queries
// ============================================================

#[rstest]
fn given_two_articles_when_getting_single_resource_then_ambiguous(model: ServiceModel) {
    // Arrange
    let host = HostDocument::resource_collection([article(1, "one", None, vec![]), article(2, "two", None, vec![])]);
    let document = DomDocument::build(&model, host, &Settings::default()).unwrap();
    let reader = document.reader();

    // Act
    let single = reader.get_resource::<Article>(false);
    let all = reader.get_resource_collection::<Article>(false).unwrap();

    // Assert
    assert!(matches!(single, Err(DocumentError::AmbiguousQuery { count: 2, .. })));
    assert_eq!(all.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(reader.get_resource_by_id::<Article, u64>(&2, false).unwrap().map(|a| a.id), Some(2));
    assert_eq!(reader.get_resource_by_id::<Article, u64>(&3, false).unwrap(), None);
}

#[rstest]
fn given_included_only_resource_when_querying_primary_then_not_found(model: ServiceModel) {
    // Arrange
    let host = HostDocument::resource(article(1, "one", Some(9), vec![])).with_included(person(9, "Dan"));
    let document = DomDocument::build(&model, host, &Settings::default()).unwrap();
    let reader = document.reader();

    // Act / Assert
    assert_eq!(reader.get_resource::<Person>(false).unwrap(), None);
    assert_eq!(reader.get_resource::<Person>(true).unwrap(), Some(&person(9, "Dan")));
}

#[rstest]
#[case::document_order(RelatedOrder::Document, vec![1, 2])]
#[case::linkage_order(RelatedOrder::Linkage, vec![2, 1])]
fn given_related_order_when_resolving_to_many_then_order_follows_setting(
    model: ServiceModel,
    #[case] related_order: RelatedOrder,
    #[case] expected: Vec<u64>,
) {
    // Arrange
    let settings = Settings {
        related_order,
        ..Settings::default()
    };
    let host = HostDocument::resource(article(1, "ordered", None, vec![2, 1]))
        .with_included(comment(1, "a"))
        .with_included(comment(2, "b"));
    let document = DomDocument::build(&model, host, &settings).unwrap();
    let reader = document.reader();
    let relationships = reader.get_resource_relationships::<Article>().unwrap().unwrap();

    // Act
    let comments = reader
        .get_related_resource_collection::<Comment>(&relationships["comments"])
        .unwrap();

    // Assert
    assert_eq!(comments.iter().map(|c| c.id).collect::<Vec<_>>(), expected);
}

#[rstest]
fn given_unmatched_linkage_when_resolving_to_many_then_missing_resources_skipped(model: ServiceModel) {
    let host = HostDocument::resource(article(1, "partial", None, vec![1, 2])).with_included(comment(2, "b"));
    let document = DomDocument::build(&model, host, &Settings::default()).unwrap();
    let reader = document.reader();
    let relationships = reader.get_resource_relationships::<Article>().unwrap().unwrap();

    let comments = reader
        .get_related_resource_collection::<Comment>(&relationships["comments"])
        .unwrap();

    assert_eq!(comments, vec![&comment(2, "b")]);
}

// ============================================================
// Cardinality
// ============================================================

#[rstest]
fn given_relationships_when_resolving_with_wrong_cardinality_then_mismatch(model: ServiceModel) {
    // Arrange
    let host = HostDocument::resource(article(1, "one", Some(9), vec![5]));
    let document = DomDocument::build(&model, host, &Settings::default()).unwrap();
    let reader = document.reader();
    let relationships = reader.get_resource_relationships::<Article>().unwrap().unwrap();

    // Act
    let as_many = reader.get_related_resource_collection::<Person>(&relationships["author"]);
    let as_one = reader.get_related_resource::<Comment>(&relationships["comments"]);

    // Assert
    assert!(matches!(
        as_many,
        Err(DocumentError::CardinalityMismatch {
            expected: Cardinality::ToMany,
            actual: Cardinality::ToOne,
            ..
        })
    ));
    assert!(matches!(
        as_one,
        Err(DocumentError::CardinalityMismatch {
            expected: Cardinality::ToOne,
            actual: Cardinality::ToMany,
            ..
        })
    ));
}

#[rstest]
fn given_links_only_relationships_when_resolving_with_wrong_cardinality_then_mismatch(model: ServiceModel) {
    // Arrange
    let wire = json!({
        "data": {
            "type": "articles",
            "id": "1",
            "attributes": {"title": "links only"},
            "relationships": {
                "author": {"links": {"related": "/articles/1/author"}},
                "comments": {"links": {"related": "/articles/1/comments"}}
            }
        }
    });
    let document = parse(&model, wire, &Settings::default()).unwrap();
    let reader = document.reader();
    let relationships = reader.get_resource_relationships::<Article>().unwrap().unwrap();

    // Act
    let comments_as_one = reader.get_related_resource::<Comment>(&relationships["comments"]);
    let author_as_many = reader.get_related_resource_collection::<Person>(&relationships["author"]);
    let comments_as_many = reader.get_related_resource_collection::<Comment>(&relationships["comments"]);
    let author_as_one = reader.get_related_resource::<Person>(&relationships["author"]);

    // Assert
    assert!(matches!(
        comments_as_one,
        Err(DocumentError::CardinalityMismatch {
            rel: Some(ref rel),
            expected: Cardinality::ToOne,
            actual: Cardinality::ToMany,
        }) if rel == "comments"
    ));
    assert!(matches!(
        author_as_many,
        Err(DocumentError::CardinalityMismatch {
            rel: Some(ref rel),
            expected: Cardinality::ToMany,
            actual: Cardinality::ToOne,
        }) if rel == "author"
    ));
    assert_eq!(comments_as_many.unwrap(), Vec::<&Comment>::new());
    assert_eq!(author_as_one.unwrap(), None);
}

#[rstest]
fn given_array_linkage_for_to_one_when_parsing_then_mismatch(model: ServiceModel) {
    let wire = json!({
        "data": {
            "type": "articles",
            "id": "1",
            "attributes": {"title": "wrong"},
            "relationships": {"author": {"data": [{"type": "people", "id": "9"}]}}
        }
    });

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(
        result,
        Err(DocumentError::CardinalityMismatch { rel: Some(ref rel), .. }) if rel == "author"
    ));
}

#[rstest]
fn given_linkage_to_wrong_type_when_parsing_then_malformed(model: ServiceModel) {
    let wire = json!({
        "data": {
            "type": "articles",
            "id": "1",
            "relationships": {"author": {"data": {"type": "comments", "id": "9"}}}
        }
    });

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(result, Err(DocumentError::MalformedDocument(_))));
}

// ============================================================
// Document invariants
// ============================================================

#[rstest]
fn given_same_identity_twice_when_building_then_malformed(model: ServiceModel) {
    let host = HostDocument::resource(article(1, "one", None, vec![])).with_included(article(1, "copy", None, vec![]));

    let result = DomDocument::build(&model, host, &Settings::default());

    assert!(matches!(result, Err(DocumentError::MalformedDocument(_))));
}

#[rstest]
fn given_duplicate_in_wire_collection_when_parsing_then_malformed(model: ServiceModel) {
    let wire = json!({
        "data": [
            {"type": "people", "id": "9", "attributes": {"name": "Dan"}},
            {"type": "people", "id": "9", "attributes": {"name": "Dan again"}}
        ]
    });

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(result, Err(DocumentError::MalformedDocument(_))));
}

#[rstest]
fn given_data_and_errors_when_parsing_then_malformed(model: ServiceModel) {
    let wire = json!({"data": null, "errors": [{"status": "500"}]});

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(result, Err(DocumentError::MalformedDocument(_))));
}

#[rstest]
fn given_included_without_data_when_parsing_then_malformed(model: ServiceModel) {
    let wire = json!({"included": [{"type": "people", "id": "9"}]});

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(result, Err(DocumentError::MalformedDocument(_))));
}

#[rstest]
fn given_resource_without_id_when_parsing_then_malformed(model: ServiceModel) {
    let wire = json!({"data": {"type": "people", "attributes": {"name": "Anonymous"}}});

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(result, Err(DocumentError::MalformedDocument(_))));
}

#[rstest]
fn given_unregistered_wire_type_when_parsing_then_model_error(model: ServiceModel) {
    let wire = json!({"data": {"type": "tags", "id": "1"}});

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(
        result,
        Err(DocumentError::Model(ModelError::UnknownResourceType(ref name))) if name == "tags"
    ));
}

#[rstest]
fn given_unregistered_host_type_when_building_then_model_error(model: ServiceModel) {
    #[derive(Debug, Default)]
    struct Tag;

    let result = DomDocument::build(&model, HostDocument::resource(Tag), &Settings::default());

    assert!(matches!(result, Err(DocumentError::Model(ModelError::UnknownHostType(_)))));
}

// ============================================================
// Undeclared members
// ============================================================

#[rstest]
#[case::lenient(false)]
#[case::strict(true)]
fn given_undeclared_attribute_when_parsing_then_strictness_decides(model: ServiceModel, #[case] strict: bool) {
    // Arrange
    let settings = Settings {
        strict_attributes: strict,
        ..Settings::default()
    };
    let wire = json!({
        "data": {"type": "people", "id": "9", "attributes": {"name": "Dan", "twitter": "@dan"}}
    });

    // Act
    let result = parse(&model, wire, &settings);

    // Assert
    if strict {
        assert!(matches!(result, Err(DocumentError::MalformedDocument(_))));
    } else {
        let document = result.unwrap();
        let parsed = document.reader().get_resource::<Person>(false).unwrap().cloned();
        assert_eq!(parsed, Some(person(9, "Dan")));
    }
}

#[rstest]
fn given_attribute_of_wrong_json_type_when_parsing_then_conversion_error(model: ServiceModel) {
    let wire = json!({"data": {"type": "people", "id": "9", "attributes": {"name": 7}}});

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(result, Err(DocumentError::Conversion(_))));
}

#[rstest]
fn given_non_numeric_id_when_parsing_then_conversion_error(model: ServiceModel) {
    let wire = json!({"data": {"type": "people", "id": "nine"}});

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(result, Err(DocumentError::Conversion(_))));
}

#[rstest]
fn given_non_numeric_linkage_id_when_parsing_then_conversion_error(model: ServiceModel) {
    let wire = json!({
        "data": {
            "type": "articles",
            "id": "1",
            "relationships": {"author": {"data": {"type": "people", "id": "nine"}}}
        }
    });

    let result = parse(&model, wire, &Settings::default());

    assert!(matches!(result, Err(DocumentError::Conversion(_))));
}

// ============================================================
// Identifier and error documents
// ============================================================

#[rstest]
fn given_identifier_document_when_reading_then_identifier_returned(model: ServiceModel) {
    // Arrange
    let document = DomDocument::build(
        &model,
        HostDocument::resource_identifier(person(9, "Dan")),
        &Settings::default(),
    )
    .unwrap();
    let reader = document.reader();

    // Act
    let identifier = reader.get_resource_identifier().unwrap().unwrap();

    // Assert
    assert_eq!(identifier.type_name, "people");
    assert_eq!(identifier.id, "9");
    assert_eq!(reader.get_resource::<Person>(true).unwrap(), None);
    assert!(matches!(
        reader.get_resource_identifier_collection(),
        Err(DocumentError::DocumentTypeMismatch {
            document_type: DocumentType::ResourceIdentifier,
            ..
        })
    ));
    assert_eq!(rendered_json(&document), json!({"data": {"type": "people", "id": "9"}}));
}

#[rstest]
fn given_identifier_collection_when_building_then_identifiers_written(model: ServiceModel) {
    // Arrange
    let host = HostDocument::resource_identifier_collection(vec![comment(5, "a"), comment(12, "b")]);

    // Act
    let document = DomDocument::build(&model, host, &Settings::default()).unwrap();

    // Assert
    assert_eq!(document.document_type(), DocumentType::ResourceIdentifierCollection);
    assert_eq!(
        rendered_json(&document),
        json!({"data": [{"type": "comments", "id": "5"}, {"type": "comments", "id": "12"}]})
    );
}

#[rstest]
fn given_identifier_collection_wire_when_parsing_then_identifiers_in_order(model: ServiceModel) {
    let wire = json!({"data": [{"type": "comments", "id": "5"}, {"type": "comments", "id": "12"}]});

    let document = parse(&model, wire, &Settings::default()).unwrap();

    let reader = document.reader();
    assert_eq!(reader.get_document_type(), DocumentType::ResourceIdentifierCollection);
    let ids: Vec<&str> = reader
        .get_resource_identifier_collection()
        .unwrap()
        .into_iter()
        .map(|identifier| identifier.id.as_str())
        .collect();
    assert_eq!(ids, vec!["5", "12"]);
}

#[rstest]
fn given_bare_resource_object_when_parsing_as_resource_then_host_materialized(model: ServiceModel) {
    // Arrange
    let document = Document::from_json(r#"{"data":{"type":"people","id":"9"}}"#).unwrap();

    // Act
    let detected = DomDocument::parse(&model, &document, &Settings::default()).unwrap();
    let expected = DomDocument::parse_as(&model, &document, DocumentType::Resource, &Settings::default()).unwrap();

    // Assert
    assert_eq!(detected.document_type(), DocumentType::ResourceIdentifier);
    assert_eq!(expected.document_type(), DocumentType::Resource);
    assert_eq!(
        expected.reader().get_resource::<Person>(false).unwrap(),
        Some(&person(9, ""))
    );
}

#[rstest]
#[case::identifiers_as_collection(
    json!({"data": [{"type": "comments", "id": "5"}]}),
    DocumentType::ResourceCollection,
    true
)]
#[case::null_as_identifier(json!({"data": null}), DocumentType::ResourceIdentifier, true)]
#[case::empty_as_identifier_collection(json!({"data": []}), DocumentType::ResourceIdentifierCollection, true)]
#[case::resource_as_identifier(
    json!({"data": {"type": "people", "id": "9", "attributes": {"name": "Dan"}}}),
    DocumentType::ResourceIdentifier,
    false
)]
#[case::errors_as_resource(json!({"errors": [{"status": "404"}]}), DocumentType::Resource, false)]
fn given_wire_shape_when_parsing_as_type_then_compatible_shapes_accepted(
    model: ServiceModel,
    #[case] wire: Value,
    #[case] document_type: DocumentType,
    #[case] accepted: bool,
) {
    let document = Document::from_json(&wire.to_string()).unwrap();

    let result = DomDocument::parse_as(&model, &document, document_type, &Settings::default());

    match result {
        Ok(parsed) => {
            assert!(accepted);
            assert_eq!(parsed.document_type(), document_type);
        }
        Err(error) => {
            assert!(!accepted);
            assert!(matches!(error, DocumentError::DocumentTypeMismatch { .. }));
        }
    }
}

#[rstest]
fn given_error_document_when_reading_then_errors_returned(model: ServiceModel) {
    // Arrange
    let error = ErrorObject {
        status: Some("422".to_string()),
        title: Some("Invalid Attribute".to_string()),
        ..ErrorObject::default()
    };

    // Act
    let document = DomDocument::build(&model, HostDocument::errors(vec![error.clone()]), &Settings::default()).unwrap();

    // Assert
    let reader = document.reader();
    assert_eq!(reader.get_document_type(), DocumentType::Errors);
    assert_eq!(reader.get_error_collection(), &[error]);
    assert_eq!(reader.get_resource::<Article>(true).unwrap(), None);
    assert_eq!(
        rendered_json(&document),
        json!({"errors": [{"status": "422", "title": "Invalid Attribute"}]})
    );
}

#[rstest]
fn given_meta_only_document_when_round_tripping_then_meta_kept(model: ServiceModel) {
    let wire = json!({"meta": {"total": 0}, "links": {"self": "/articles"}});

    let document = parse(&model, wire.clone(), &Settings::default()).unwrap();

    let reader = document.reader();
    assert_eq!(reader.get_document_type(), DocumentType::Document);
    assert_eq!(reader.get_document_meta().map(|meta| meta["total"].clone()), Some(json!(0)));
    assert_eq!(reader.get_document_links().map(|links| links["self"].href.as_str()), Some("/articles"));
    assert_eq!(rendered_json(&document), wire);
}

// ============================================================
// Diagnostics
// ============================================================

#[rstest]
fn given_built_document_when_rendering_tree_then_resource_nodes_are_labelled(model: ServiceModel) {
    let host = HostDocument::resource(article(1, "one", None, vec![]));
    let document = DomDocument::build(&model, host, &Settings::default()).unwrap();

    let rendered = document.to_tree_string().to_string();

    assert!(rendered.starts_with("document\n"));
    assert!(rendered.contains("resource [type=articles, id=1]"));
    assert!(rendered.contains("attribute [name=title]"));
}

#[rstest]
fn given_wire_document_when_parsing_through_document_then_same_as_from_json(model: ServiceModel) {
    let wire = json!({"data": {"type": "people", "id": "9", "attributes": {"name": "Dan"}}});
    let document = Document::from_json(&wire.to_string()).unwrap();

    let parsed = DomDocument::parse(&model, &document, &Settings::default()).unwrap();

    assert_eq!(parsed.write().unwrap(), document);
}
