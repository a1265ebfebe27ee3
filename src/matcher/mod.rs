//! Recovers the request a Lanzou page would send, by replaying the page's own
//! scripts up to its `$.ajax` call.

mod fetch;
pub mod locators;
pub mod recipes;
mod tests;

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use scraper::Html;
use strum_macros::{Display, EnumString, VariantNames};
use url::Url;

pub use fetch::{is_denied, resolve_source, ScriptFetcher};
pub use locators::{match_iframe, parse_error_page};
pub use recipes::{Recipe, Rule, Step};

use crate::{
    models::{AjaxDescriptor, PageScripts},
    utils::{
        html::{DOMProcessor, ScriptTag, ScriptValue},
        script::{self, EvalError, Sandbox, Value},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum PageShape {
    Folder,
    FolderWithPassword,
    File,
    FileWithPassword,
    Validation,
    FileMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Variable,
    Data,
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Part::Variable => f.write_str("variable setup"),
            Part::Data => f.write_str("request literal"),
        }
    }
}

/// Every variant means the page no longer looks like its recipe expects.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractError {
    PatternNotFound { recipe: &'static str, part: Part },
    Eval(EvalError),
    Shape(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExtractError::PatternNotFound { recipe, part } => {
                write!(f, "[{recipe}] {part} not found in page scripts")
            }
            ExtractError::Eval(err) => write!(f, "recovered request failed to evaluate: {err}"),
            ExtractError::Shape(message) => write!(f, "unexpected request shape: {message}"),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<EvalError> for ExtractError {
    fn from(value: EvalError) -> Self {
        ExtractError::Eval(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSet {
    /// External sources left after the denylist, resolved when possible.
    pub sources: Vec<String>,
    pub inline: Vec<String>,
}

impl ScriptSet {
    pub fn from_html(html: &str, base: Option<&Url>) -> ScriptSet {
        let document = Html::parse_document(html);
        let tags = ScriptValue
            .itr_scope("html script")
            .process(&document.root_element());

        let mut scripts = ScriptSet::default();
        for tag in tags {
            match tag {
                ScriptTag::External(src) if is_denied(&src) => {
                    debug!("[matcher] skipping script {src}")
                }
                ScriptTag::External(src) => scripts.sources.push(resolve_source(base, &src)),
                ScriptTag::Inline(text) => scripts.inline.push(text),
            }
        }

        scripts
    }
}

pub struct Matcher<F> {
    fetcher: F,
    base_url: Option<Url>,
}

impl<F: ScriptFetcher> Matcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub async fn format_script(&self, html: &str) -> PageScripts {
        let scripts = ScriptSet::from_html(html, self.base_url.as_ref());
        self.normalize(scripts).await
    }

    pub async fn normalize(&self, scripts: ScriptSet) -> PageScripts {
        if scripts.inline.is_empty() {
            return PageScripts::default();
        }

        let external = fetch::fetch_all(&self.fetcher, &scripts.sources).await;
        let prelude = script::format(&external.join("\n"));

        let page = scripts
            .inline
            .iter()
            .map(|source| script::format(source))
            .filter(|formatted| !formatted.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        PageScripts { page, prelude }
    }

    pub async fn parse_ajax_data(
        &self,
        html: &str,
        recipe: &Recipe,
    ) -> Result<AjaxDescriptor, ExtractError> {
        let scripts = self.format_script(html).await;
        extract(&scripts, recipe)
    }

    /// Folder listing request, without the password field.
    pub async fn parse_folder_ajax(&self, html: &str) -> Result<AjaxDescriptor, ExtractError> {
        self.parse_ajax_data(html, &Recipe::folder()).await
    }

    pub async fn parse_folder_pwd_ajax(
        &self,
        html: &str,
        password: &str,
    ) -> Result<AjaxDescriptor, ExtractError> {
        self.parse_ajax_data(html, &Recipe::folder_with_password(password))
            .await
    }

    pub async fn parse_ajax(&self, html: &str) -> Result<AjaxDescriptor, ExtractError> {
        self.parse_ajax_data(html, &Recipe::file()).await
    }

    pub async fn parse_pwd_ajax(
        &self,
        html: &str,
        password: &str,
    ) -> Result<AjaxDescriptor, ExtractError> {
        self.parse_ajax_data(html, &Recipe::file_with_password(password))
            .await
    }

    /// `Ok(None)` when the page carries no download challenge.
    pub async fn parse_validate_ajax(
        &self,
        html: &str,
    ) -> Result<Option<AjaxDescriptor>, ExtractError> {
        let scripts = self.format_script(html).await;

        let Some(target) = recipes::validation_target(&scripts.page) else {
            debug!("[matcher] no download challenge on page");
            return Ok(None);
        };
        let Some(handler) = locators::click_handler(html, target) else {
            debug!("[matcher] challenge target {target} has no click handler");
            return Ok(None);
        };

        let missing = ExtractError::PatternNotFound {
            recipe: "validation",
            part: Part::Variable,
        };
        let param = recipes::validation_param(&scripts.page).ok_or(missing.clone())?;
        let args = recipes::handler_arguments(&handler).ok_or(missing)?;

        extract(&scripts, &Recipe::validation(param, args)).map(Some)
    }

    pub async fn parse_file_more_ajax(&self, html: &str) -> Result<AjaxDescriptor, ExtractError> {
        self.parse_ajax_data(html, &Recipe::file_more()).await
    }

    pub async fn parse_page(
        &self,
        html: &str,
        shape: PageShape,
        password: &str,
    ) -> Result<Option<AjaxDescriptor>, ExtractError> {
        let descriptor = match shape {
            PageShape::Folder => self.parse_folder_ajax(html).await?,
            PageShape::FolderWithPassword => self.parse_folder_pwd_ajax(html, password).await?,
            PageShape::File => self.parse_ajax(html).await?,
            PageShape::FileWithPassword => self.parse_pwd_ajax(html, password).await?,
            PageShape::Validation => return self.parse_validate_ajax(html).await,
            PageShape::FileMore => self.parse_file_more_ajax(html).await?,
        };
        Ok(Some(descriptor))
    }
}

pub fn extract(scripts: &PageScripts, recipe: &Recipe) -> Result<AjaxDescriptor, ExtractError> {
    let variable = recipe
        .variable
        .apply(&scripts.page)
        .ok_or(ExtractError::PatternNotFound {
            recipe: recipe.name,
            part: Part::Variable,
        })?;
    let data = recipe
        .data
        .apply(&scripts.page)
        .ok_or(ExtractError::PatternNotFound {
            recipe: recipe.name,
            part: Part::Data,
        })?;

    let mut sandbox = Sandbox::new();
    sandbox.run(&format!("{}{}", scripts.prelude, variable))?;
    let value = sandbox.evaluate(&data)?;

    to_descriptor(value)
}

fn to_descriptor(value: Value) -> Result<AjaxDescriptor, ExtractError> {
    let Value::Object(mut fields) = value else {
        return Err(ExtractError::Shape(format!(
            "expected an object, got {}",
            value.type_of()
        )));
    };

    let url = match fields.shift_remove("url") {
        Some(Value::String(url)) => url,
        Some(other) => {
            return Err(ExtractError::Shape(format!(
                "url is {}, not a string",
                other.type_of()
            )))
        }
        None => return Err(ExtractError::Shape("url is missing".into())),
    };

    let method = match fields.get("type").or_else(|| fields.get("method")) {
        Some(Value::String(method)) => method.clone(),
        _ => "get".into(),
    };

    let data = match fields.shift_remove("data") {
        None | Some(Value::Undefined | Value::Null) => None,
        Some(Value::String(body)) => Some(
            url::form_urlencoded::parse(body.as_bytes())
                .into_owned()
                .collect(),
        ),
        Some(Value::Object(map)) => Some(flatten_data(map)?),
        Some(other) => {
            return Err(ExtractError::Shape(format!(
                "data is {}",
                other.type_of()
            )))
        }
    };

    Ok(AjaxDescriptor { method, url, data })
}

fn flatten_data(map: IndexMap<String, Value>) -> Result<IndexMap<String, String>, ExtractError> {
    map.into_iter()
        .map(|(key, value)| {
            let flat = match value {
                Value::Undefined | Value::Null => String::new(),
                Value::String(value) => value,
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                other => {
                    return Err(ExtractError::Shape(format!(
                        "data.{key} is a nested {}",
                        other.type_of()
                    )))
                }
            };
            Ok((key, flat))
        })
        .collect()
}
