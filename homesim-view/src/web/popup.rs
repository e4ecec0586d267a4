use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, MouseEvent};

use crate::document::{POPUP_CLOSE_ID, POPUP_HEADER_ID, POPUP_ID};
use crate::popup::{Point, Popup};

fn html_element(document: &web_sys::Document, id: &str) -> Result<HtmlElement, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not an html element")))
}

fn pointer(event: &MouseEvent) -> Point {
    Point::new(event.client_x() as f64, event.client_y() as f64)
}

fn listen(
    target: &web_sys::EventTarget,
    kind: &str,
    handler: impl FnMut(MouseEvent) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(MouseEvent)>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Wire up dragging and closing of the popup. The drag state lives only in
/// these handlers.
pub(super) fn bind(document: &web_sys::Document) -> Result<(), JsValue> {
    let element = html_element(document, POPUP_ID)?;
    let header = html_element(document, POPUP_HEADER_ID)?;
    let close = html_element(document, POPUP_CLOSE_ID)?;

    let popup = Rc::new(RefCell::new(Popup::default()));

    listen(&header, "mousedown", {
        let popup = Rc::clone(&popup);
        let element = element.clone();
        move |event| {
            let mut popup = popup.borrow_mut();
            popup.move_to(Point::new(element.offset_left() as f64, element.offset_top() as f64));
            popup.press(pointer(&event));
        }
    })?;

    listen(document, "mousemove", {
        let popup = Rc::clone(&popup);
        let element = element.clone();
        move |event| {
            let Some(position) = popup.borrow_mut().pointer_moved(pointer(&event)) else {
                return;
            };
            let style = element.style();
            let _ = style.set_property("left", &format!("{}px", position.x));
            let _ = style.set_property("top", &format!("{}px", position.y));
        }
    })?;

    listen(document, "mouseup", {
        let popup = Rc::clone(&popup);
        move |_| popup.borrow_mut().release()
    })?;

    listen(&close, "click", move |_| {
        popup.borrow_mut().close();
        let _ = element.style().set_property("display", "none");
    })?;

    Ok(())
}
