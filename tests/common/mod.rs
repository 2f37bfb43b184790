#![allow(dead_code)]

use jsonapi_dom::document::{Links, Meta};
use jsonapi_dom::model::ServiceModel;
use jsonapi_dom::util::testing;
use jsonapi_dom::ResourceType;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub author_id: Option<u64>,
    pub comment_ids: Vec<u64>,
    pub links: Option<Links>,
    pub meta: Option<Meta>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Person {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub body: String,
}

pub fn article(id: u64, title: &str, author_id: Option<u64>, comment_ids: Vec<u64>) -> Article {
    Article {
        id,
        title: title.to_string(),
        author_id,
        comment_ids,
        ..Article::default()
    }
}

pub fn person(id: u64, name: &str) -> Person {
    Person {
        id,
        name: name.to_string(),
    }
}

pub fn comment(id: u64, body: &str) -> Comment {
    Comment {
        id,
        body: body.to_string(),
    }
}

/// articles -> people (author), articles -> comments (comments)
pub fn blog_model() -> ServiceModel {
    testing::init_test_setup();
    ServiceModel::builder()
        .resource_type(
            ResourceType::builder::<Article>("articles")
                .id(|a: &Article| Some(a.id), |a: &mut Article, id: u64| a.id = id)
                .attribute(
                    "title",
                    |a: &Article| a.title.clone(),
                    |a: &mut Article, title: String| a.title = title,
                )
                .to_one::<Person, u64, _, _>(
                    "author",
                    |a: &Article| a.author_id,
                    |a: &mut Article, id: Option<u64>| a.author_id = id,
                )
                .to_many::<Comment, u64, _, _>(
                    "comments",
                    |a: &Article| a.comment_ids.clone(),
                    |a: &mut Article, ids: Vec<u64>| a.comment_ids = ids,
                )
                .links(
                    |a: &Article| a.links.clone(),
                    |a: &mut Article, links: Links| a.links = Some(links),
                )
                .meta(
                    |a: &Article| a.meta.clone(),
                    |a: &mut Article, meta: Meta| a.meta = Some(meta),
                ),
        )
        .resource_type(
            ResourceType::builder::<Person>("people")
                .id(|p: &Person| Some(p.id), |p: &mut Person, id: u64| p.id = id)
                .attribute(
                    "name",
                    |p: &Person| p.name.clone(),
                    |p: &mut Person, name: String| p.name = name,
                ),
        )
        .resource_type(
            ResourceType::builder::<Comment>("comments")
                .id(|c: &Comment| Some(c.id), |c: &mut Comment, id: u64| c.id = id)
                .attribute(
                    "body",
                    |c: &Comment| c.body.clone(),
                    |c: &mut Comment, body: String| c.body = body,
                ),
        )
        .build()
        .expect("blog model is valid")
}
