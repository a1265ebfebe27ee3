use scraper::{ElementRef, Selector};

// base
pub trait DOMProcessor<T>: Sync + Send {
    fn process(&self, el: &ElementRef) -> T;
}

// text nodes
#[derive(Default)]
pub struct TextValue {
    pub all_nodes: bool,
}

impl DOMProcessor<String> for TextValue {
    fn process(&self, el: &ElementRef) -> String {
        if self.all_nodes {
            el.text().collect()
        } else {
            el.text().next().unwrap_or_default().into()
        }
    }
}

impl From<TextValue> for Box<dyn DOMProcessor<String>> {
    fn from(value: TextValue) -> Self {
        Box::new(value)
    }
}

impl TextValue {
    pub fn new() -> TextValue {
        TextValue { all_nodes: false }
    }

    pub fn all_nodes(mut self) -> Self {
        self.all_nodes = true;
        self
    }

    pub fn itr_scope(self, selectors: &str) -> ItemsProcessor<String> {
        ItemsProcessor::new(selectors, self.into())
    }
}

// attributes
pub struct AttrValue {
    pub attr: &'static str,
}

impl DOMProcessor<String> for AttrValue {
    fn process(&self, el: &ElementRef) -> String {
        el.attr(self.attr).map(|s| s.into()).unwrap_or_default()
    }
}

impl From<AttrValue> for Box<dyn DOMProcessor<String>> {
    fn from(value: AttrValue) -> Self {
        Box::new(value)
    }
}

impl AttrValue {
    pub fn new(attr: &'static str) -> AttrValue {
        AttrValue { attr }
    }

    pub fn in_scope(self, selectors: &str) -> ScopeProcessor<String> {
        ScopeProcessor::new(selectors, self.into())
    }
}

// script tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptTag {
    External(String),
    Inline(String),
}

pub struct ScriptValue;

impl DOMProcessor<ScriptTag> for ScriptValue {
    fn process(&self, el: &ElementRef) -> ScriptTag {
        match el.attr("src").filter(|src| !src.is_empty()) {
            Some(src) => ScriptTag::External(src.to_owned()),
            None => ScriptTag::Inline(el.text().collect()),
        }
    }
}

impl From<ScriptValue> for Box<dyn DOMProcessor<ScriptTag>> {
    fn from(value: ScriptValue) -> Self {
        Box::new(value)
    }
}

impl ScriptValue {
    pub fn itr_scope(self, selectors: &str) -> ItemsProcessor<ScriptTag> {
        ItemsProcessor::new(selectors, self.into())
    }
}

// transformation
pub struct MapValue<In, Out> {
    pub map: Box<dyn Fn(In) -> Out + Sync + Send>,
    pub sub_processor: Box<dyn DOMProcessor<In>>,
}

impl<In, Out> DOMProcessor<Out> for MapValue<In, Out> {
    fn process(&self, el: &ElementRef) -> Out {
        let input = self.sub_processor.process(el);
        (self.map)(input)
    }
}

impl<In, Out> MapValue<In, Out> {
    pub fn new<Map>(map: Map, sub_processor: Box<dyn DOMProcessor<In>>) -> MapValue<In, Out>
    where
        Map: Fn(In) -> Out + 'static + Sync + Send,
    {
        MapValue {
            map: Box::new(map),
            sub_processor,
        }
    }
}

// lists
pub struct ItemsProcessor<Item> {
    pub scope: Selector,
    pub item_processor: Box<dyn DOMProcessor<Item>>,
}

impl<Item> DOMProcessor<Vec<Item>> for ItemsProcessor<Item> {
    fn process(&self, el: &ElementRef) -> Vec<Item> {
        el.select(&self.scope)
            .map(|e| self.item_processor.process(&e))
            .collect()
    }
}

impl<Item: 'static> From<ItemsProcessor<Item>> for Box<dyn DOMProcessor<Vec<Item>>> {
    fn from(value: ItemsProcessor<Item>) -> Self {
        Box::new(value)
    }
}

impl<Item> ItemsProcessor<Item> {
    pub fn new(scope: &str, item_processor: Box<dyn DOMProcessor<Item>>) -> ItemsProcessor<Item> {
        ItemsProcessor {
            scope: Selector::parse(scope).unwrap(),
            item_processor,
        }
    }
}

impl<Item: 'static> ItemsProcessor<Item> {
    pub fn map<Map, Out>(self, map: Map) -> MapValue<Vec<Item>, Out>
    where
        Map: Fn(Vec<Item>) -> Out + 'static + Sync + Send,
    {
        MapValue::new(map, self.into())
    }
}

// scope
pub struct ScopeProcessor<Item> {
    pub scope: Selector,
    pub item_processor: Box<dyn DOMProcessor<Item>>,
}

impl<Item> DOMProcessor<Option<Item>> for ScopeProcessor<Item> {
    fn process(&self, el: &ElementRef) -> Option<Item> {
        el.select(&self.scope)
            .map(|e| self.item_processor.process(&e))
            .next()
    }
}

impl<Item> ScopeProcessor<Item> {
    pub fn new(scope: &str, item_processor: Box<dyn DOMProcessor<Item>>) -> ScopeProcessor<Item> {
        ScopeProcessor {
            scope: Selector::parse(scope).unwrap(),
            item_processor,
        }
    }

    /// For selectors read from page content, which may not parse.
    pub fn try_new(
        scope: &str,
        item_processor: Box<dyn DOMProcessor<Item>>,
    ) -> Option<ScopeProcessor<Item>> {
        Some(ScopeProcessor {
            scope: Selector::parse(scope).ok()?,
            item_processor,
        })
    }
}
