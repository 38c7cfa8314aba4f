// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Orientation and flow-direction resolution for items panels.
//!
//! Resolved fresh on every tick: a virtualizing control may swap its realized
//! panel, and template changes can restructure the item presenter between
//! two drag-over callbacks.

use crate::host::ItemsHost;
use crate::types::{FlowDirection, ItemsKind, Orientation, PanelKind, TabPlacement};

/// Resolve the stacking orientation and flow direction of `control`.
///
/// Precedence:
/// 1. `orientation_override`, when the author knows better (custom panels).
/// 2. Tab strip placement for tab controls: left/right stacks vertically,
///    top/bottom horizontally.
/// 3. A uniform grid panel is vertical with one column, horizontal otherwise.
/// 4. A panel's own orientation property.
/// 5. Vertical.
///
/// Flow direction comes from the realized panel, else from the control.
pub fn resolve<H: ItemsHost + ?Sized>(
    host: &H,
    control: H::Node,
    orientation_override: Option<Orientation>,
) -> (Orientation, FlowDirection) {
    let panel = host.items_panel(control).and_then(|p| host.panel_info(p));
    let flow = panel.map_or_else(|| host.flow_direction(control), |p| p.flow_direction);

    if let Some(orientation) = orientation_override {
        return (orientation, flow);
    }

    if host.items_kind(control) == Some(ItemsKind::TabControl)
        && let Some(placement) = host.tab_placement(control)
    {
        let orientation = match placement {
            TabPlacement::Left | TabPlacement::Right => Orientation::Vertical,
            TabPlacement::Top | TabPlacement::Bottom => Orientation::Horizontal,
        };
        return (orientation, flow);
    }

    let orientation = match panel {
        Some(info) => match info.kind {
            PanelKind::UniformGrid { columns: 1 } => Orientation::Vertical,
            PanelKind::UniformGrid { .. } => Orientation::Horizontal,
            _ => info.orientation.unwrap_or_else(|| {
                log::debug!("panel of {control:?} reports no orientation; assuming vertical");
                Orientation::Vertical
            }),
        },
        None => {
            log::debug!("no realized items panel for {control:?}; assuming vertical");
            Orientation::Vertical
        }
    };
    (orientation, flow)
}
