//! Browser bindings: a [`Document`] over the live DOM plus the entry point
//! exported to JavaScript.

mod popup;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, HtmlElement};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::renderer::RoomRenderer;
use crate::source::{DeviceSource, HttpSource};

type Renderer = Rc<RefCell<RoomRenderer<WebDocument>>>;

fn js_error(value: JsValue) -> Error {
    Error::document(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

fn to_js(error: Error) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Log to both tracing and the browser console.
fn warn(message: &str) {
    tracing::warn!("{}", message);
    web_sys::console::warn_1(&JsValue::from_str(message));
}

/// [`Document`] backed by `web_sys`.
///
/// Click handlers only push the device id onto a channel, so no handler ever
/// touches the renderer while it is mid-update.
pub struct WebDocument {
    document: web_sys::Document,
    clicks: UnboundedSender<String>,
    handlers: HashMap<String, Closure<dyn FnMut(Event)>>,
}

impl WebDocument {
    pub fn new(document: web_sys::Document) -> (Self, UnboundedReceiver<String>) {
        let (clicks, receiver) = mpsc::unbounded();
        let document = Self {
            document,
            clicks,
            handlers: HashMap::new(),
        };
        (document, receiver)
    }

    fn collect(collection: web_sys::HtmlCollection) -> Vec<Element> {
        (0..collection.length())
            .filter_map(|index| collection.item(index))
            .collect()
    }
}

impl Document for WebDocument {
    type Node = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn elements_by_class(&self, class: &str) -> Vec<Element> {
        Self::collect(self.document.get_elements_by_class_name(class))
    }

    fn children(&self, node: &Element) -> Vec<Element> {
        Self::collect(node.children())
    }

    fn create_element(&mut self, tag: &str) -> Result<Element> {
        self.document.create_element(tag).map_err(js_error)
    }

    fn append_child(&mut self, parent: &Element, child: &Element) -> Result<()> {
        parent.append_child(child).map(|_| ()).map_err(js_error)
    }

    fn remove(&mut self, node: &Element) {
        self.handlers.remove(&node.id());
        node.remove();
    }

    fn set_id(&mut self, node: &Element, id: &str) {
        node.set_id(id);
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) -> Result<()> {
        node.set_attribute(name, value).map_err(js_error)
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&mut self, node: &Element, class: &str) -> Result<()> {
        node.class_list().add_1(class).map_err(js_error)
    }

    fn remove_class(&mut self, node: &Element, class: &str) -> Result<()> {
        node.class_list().remove_1(class).map_err(js_error)
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) -> Result<()> {
        let element = node
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| Error::document(format!("<{}> has no style", node.tag_name())))?;
        element.style().set_property(property, value).map_err(js_error)
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn bind_toggle(&mut self, node: &Element, device_id: &str) -> Result<()> {
        let clicks = self.clicks.clone();
        let device_id = device_id.to_string();
        let handler = Closure::wrap(Box::new(move |_event: Event| {
            let _ = clicks.unbounded_send(device_id.clone());
        }) as Box<dyn FnMut(Event)>);

        node.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
            .map_err(js_error)?;
        self.handlers.insert(node.id(), handler);
        Ok(())
    }
}

/// Start the room view on the current page.
///
/// `base_url` is the backend root; an empty string means the page's own
/// origin. The device map is re-fetched every `interval_ms` milliseconds.
#[wasm_bindgen]
pub fn start_room_view(base_url: String, interval_ms: u32) -> std::result::Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let page = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let base_url = if base_url.is_empty() {
        window.location().origin()?
    } else {
        base_url
    };
    let source = Rc::new(HttpSource::new(&base_url).map_err(to_js)?);

    let (document, clicks) = WebDocument::new(page.clone());
    let renderer: Renderer = Rc::new(RefCell::new(RoomRenderer::new(document).map_err(to_js)?));

    popup::bind(&page)?;

    spawn_local(initial_render(Rc::clone(&renderer), Rc::clone(&source)));
    spawn_local(handle_clicks(Rc::clone(&renderer), Rc::clone(&source), clicks));

    let tick = Closure::wrap(Box::new(move || {
        spawn_local(reconcile(Rc::clone(&renderer), Rc::clone(&source)));
    }) as Box<dyn FnMut()>);

    window.set_interval_with_callback_and_timeout_and_arguments_0(
        tick.as_ref().unchecked_ref(),
        interval_ms.max(10) as i32,
    )?;
    tick.forget();

    Ok(())
}

async fn initial_render(renderer: Renderer, source: Rc<HttpSource>) {
    let result = match source.fetch_devices().await {
        Ok(snapshot) => renderer.borrow_mut().initial_render(&snapshot),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        warn(&format!("Initial render failed: {e}"));
    }
}

async fn reconcile(renderer: Renderer, source: Rc<HttpSource>) {
    let result = match source.fetch_devices().await {
        Ok(snapshot) => renderer.borrow_mut().reconcile(&snapshot),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        warn(&format!("Error fetching devices: {e}"));
    }
}

async fn handle_clicks(
    renderer: Renderer,
    source: Rc<HttpSource>,
    mut clicks: UnboundedReceiver<String>,
) {
    while let Some(device_id) = clicks.next().await {
        let flipped = renderer.borrow_mut().toggle_local(&device_id);
        match flipped {
            Ok(Some(_)) => {
                let source = Rc::clone(&source);
                spawn_local(async move {
                    if let Err(e) = source.toggle(&device_id).await {
                        warn(&format!("Toggle request for {device_id} failed: {e}"));
                    }
                });
            }
            Ok(None) => {}
            Err(e) => warn(&format!("Failed to flip {device_id}: {e}")),
        }
    }
}
