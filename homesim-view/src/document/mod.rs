mod memory;

pub use memory::{MemoryDocument, NodeId};

use crate::error::Result;

/// Id of the floor plan container holding control icons.
pub const ROOM_ID: &str = "room";
/// Id of the table holding one row per sensor.
pub const SENSOR_TABLE_ID: &str = "sensorsTable";
/// Id of the draggable popup.
pub const POPUP_ID: &str = "popup";
/// Id of the popup header used as drag handle.
pub const POPUP_HEADER_ID: &str = "popup_header";
/// Id of the control closing the popup.
pub const POPUP_CLOSE_ID: &str = "close_popup";

/// The DOM surface the room view mutates.
///
/// Follows browser DOM semantics: ids are looked up in tree order and
/// detached elements are invisible to lookups.
pub trait Document {
    type Node: Clone + PartialEq;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Attached elements carrying `class`, in tree order.
    fn elements_by_class(&self, class: &str) -> Vec<Self::Node>;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn create_element(&mut self, tag: &str) -> Result<Self::Node>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<()>;

    /// Detaches the node from the tree.
    fn remove(&mut self, node: &Self::Node);

    fn set_id(&mut self, node: &Self::Node, id: &str);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<()>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn add_class(&mut self, node: &Self::Node, class: &str) -> Result<()>;

    fn remove_class(&mut self, node: &Self::Node, class: &str) -> Result<()>;

    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str) -> Result<()>;

    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Routes clicks on `node` to a toggle of `device_id`.
    fn bind_toggle(&mut self, node: &Self::Node, device_id: &str) -> Result<()>;
}
