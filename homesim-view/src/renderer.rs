use homesim_api::{Control, Device, DeviceSnapshot, Sensor};

use crate::document::{Document, ROOM_ID, SENSOR_TABLE_ID};
use crate::error::{Error, Result};

pub const CONTROL_CLASS: &str = "control";
pub const SENSOR_CLASS: &str = "sensor";
pub const ACTIVATED_CLASS: &str = "activated";
/// Marker applied before a refresh; whatever still carries it afterwards is removed.
pub const STALE_CLASS: &str = "stale";
pub const DEVICE_ID_ATTRIBUTE: &str = "data-device-id";
const ICON_ATTRIBUTE: &str = "data-icon";

pub fn control_element_id(device_id: &str) -> String {
    format!("control_{device_id}")
}

pub fn sensor_element_id(device_id: &str) -> String {
    format!("sensor_{device_id}")
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    /// Elements created for devices seen for the first time
    pub created: usize,
    /// Existing elements updated in place
    pub updated: usize,
    /// Elements removed because their device disappeared
    pub removed: usize,
    /// Elements kept as-is because this response carried an invalid record for them
    pub retained: usize,
}

impl RenderReport {
    pub fn changed_structure(&self) -> bool {
        self.created > 0 || self.removed > 0
    }
}

/// Renders a device map into a [`Document`] and keeps it in sync.
///
/// Elements are keyed by stable ids (`control_<id>`, `sensor_<id>`), so both
/// controls and sensors are created on first sight, updated in place on
/// later passes and swept once their device is gone.
pub struct RoomRenderer<D: Document> {
    document: D,
    room: D::Node,
    sensor_table: D::Node,
}

impl<D: Document> RoomRenderer<D> {
    pub fn new(document: D) -> Result<Self> {
        let room = document
            .element_by_id(ROOM_ID)
            .ok_or_else(|| Error::MissingContainer(ROOM_ID.to_string()))?;
        let sensor_table = document
            .element_by_id(SENSOR_TABLE_ID)
            .ok_or_else(|| Error::MissingContainer(SENSOR_TABLE_ID.to_string()))?;

        Ok(Self {
            document,
            room,
            sensor_table,
        })
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }

    /// First render into empty containers; nothing is removed.
    pub fn initial_render(&mut self, snapshot: &DeviceSnapshot) -> Result<RenderReport> {
        let mut report = RenderReport::default();
        for (id, device) in snapshot.devices() {
            self.upsert(id, device, &mut report)?;
        }
        Ok(report)
    }

    /// Brings the document in line with `snapshot`.
    ///
    /// On error the stale markers are lifted again so the document keeps its
    /// last-known-good content.
    pub fn reconcile(&mut self, snapshot: &DeviceSnapshot) -> Result<RenderReport> {
        self.mark_stale()?;

        let mut report = RenderReport::default();
        if let Err(e) = self.refresh(snapshot, &mut report) {
            self.clear_stale();
            return Err(e);
        }

        report.removed = self.sweep();
        Ok(report)
    }

    fn refresh(&mut self, snapshot: &DeviceSnapshot, report: &mut RenderReport) -> Result<()> {
        for (id, device) in snapshot.devices() {
            self.upsert(id, device, report)?;
        }

        for id in snapshot.rejected().keys() {
            for element_id in [control_element_id(id), sensor_element_id(id)] {
                if let Some(node) = self.document.element_by_id(&element_id) {
                    self.document.remove_class(&node, STALE_CLASS)?;
                    report.retained += 1;
                }
            }
        }

        Ok(())
    }

    /// Flips the local `activated` class of a rendered control.
    ///
    /// Returns the new state, or `None` when no such control is rendered.
    pub fn toggle_local(&mut self, device_id: &str) -> Result<Option<bool>> {
        let Some(node) = self.document.element_by_id(&control_element_id(device_id)) else {
            return Ok(None);
        };

        if self.document.has_class(&node, ACTIVATED_CLASS) {
            self.document.remove_class(&node, ACTIVATED_CLASS)?;
            Ok(Some(false))
        } else {
            self.document.add_class(&node, ACTIVATED_CLASS)?;
            Ok(Some(true))
        }
    }

    /// Whether the control is rendered as activated, `None` if not rendered.
    pub fn is_activated(&self, device_id: &str) -> Option<bool> {
        self.document
            .element_by_id(&control_element_id(device_id))
            .map(|node| self.document.has_class(&node, ACTIVATED_CLASS))
    }

    fn rendered(&self) -> Vec<D::Node> {
        let mut nodes = self.document.elements_by_class(CONTROL_CLASS);
        nodes.extend(self.document.elements_by_class(SENSOR_CLASS));
        nodes
    }

    fn mark_stale(&mut self) -> Result<()> {
        for node in self.rendered() {
            self.document.add_class(&node, STALE_CLASS)?;
        }
        Ok(())
    }

    fn clear_stale(&mut self) {
        for node in self.document.elements_by_class(STALE_CLASS) {
            if let Err(e) = self.document.remove_class(&node, STALE_CLASS) {
                tracing::warn!("Failed to clear stale marker: {}", e);
            }
        }
    }

    fn sweep(&mut self) -> usize {
        let stale = self.document.elements_by_class(STALE_CLASS);
        for node in &stale {
            if let Some(device_id) = self.document.attribute(node, DEVICE_ID_ATTRIBUTE) {
                tracing::debug!(device = %device_id, "Removing element of vanished device");
            }
            self.document.remove(node);
        }
        stale.len()
    }

    fn upsert(&mut self, id: &str, device: &Device, report: &mut RenderReport) -> Result<()> {
        match device {
            Device::Control(control) => {
                match self.document.element_by_id(&control_element_id(id)) {
                    Some(node) => {
                        self.apply_control(&node, control)?;
                        report.updated += 1;
                    }
                    None => {
                        self.create_control(id, control)?;
                        report.created += 1;
                    }
                }
            }
            Device::Sensor(sensor) => {
                match self.document.element_by_id(&sensor_element_id(id)) {
                    Some(node) if self.document.children(&node).len() == 3 => {
                        self.apply_sensor(&node, sensor)?;
                        report.updated += 1;
                    }
                    Some(node) => {
                        tracing::warn!(device = %id, "Rebuilding malformed sensor row");
                        self.document.remove(&node);
                        self.create_sensor(id, sensor)?;
                        report.created += 1;
                    }
                    None => {
                        self.create_sensor(id, sensor)?;
                        report.created += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn create_control(&mut self, id: &str, control: &Control) -> Result<()> {
        let node = self.document.create_element("div")?;
        self.document.set_id(&node, &control_element_id(id));
        self.document.set_attribute(&node, DEVICE_ID_ATTRIBUTE, id)?;
        self.document.add_class(&node, CONTROL_CLASS)?;
        self.apply_control(&node, control)?;
        self.document.bind_toggle(&node, id)?;
        self.document.append_child(&self.room, &node)
    }

    fn apply_control(&mut self, node: &D::Node, control: &Control) -> Result<()> {
        let icon = control.ui.icon.as_str();
        if let Some(previous) = self.document.attribute(node, ICON_ATTRIBUTE) {
            if previous != icon && previous != CONTROL_CLASS {
                self.document.remove_class(node, &previous)?;
            }
        }
        self.document.add_class(node, icon)?;
        self.document.set_attribute(node, ICON_ATTRIBUTE, icon)?;

        if control.activated {
            self.document.add_class(node, ACTIVATED_CLASS)?;
        } else {
            self.document.remove_class(node, ACTIVATED_CLASS)?;
        }

        self.document.set_style(node, "left", &format!("{}%", control.ui.x))?;
        self.document.set_style(node, "top", &format!("{}%", control.ui.y))?;
        self.document.remove_class(node, STALE_CLASS)
    }

    fn create_sensor(&mut self, id: &str, sensor: &Sensor) -> Result<()> {
        let row = self.document.create_element("tr")?;
        self.document.set_id(&row, &sensor_element_id(id));
        self.document.set_attribute(&row, DEVICE_ID_ATTRIBUTE, id)?;
        self.document.add_class(&row, SENSOR_CLASS)?;

        for text in [id.to_string(), sensor.data.formatted_value(), sensor.data.unit.clone()] {
            let cell = self.document.create_element("td")?;
            self.document.set_text(&cell, &text);
            self.document.append_child(&row, &cell)?;
        }

        self.document.append_child(&self.sensor_table, &row)
    }

    fn apply_sensor(&mut self, row: &D::Node, sensor: &Sensor) -> Result<()> {
        let cells = self.document.children(row);
        self.document.set_text(&cells[1], &sensor.data.formatted_value());
        self.document.set_text(&cells[2], &sensor.data.unit);
        self.document.remove_class(row, STALE_CLASS)
    }
}
