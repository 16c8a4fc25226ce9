//! Volumes section: the group slider plus one slider per member.

use serde::Serialize;

use crate::store::Store;
use crate::volume::VolumeSlider;

use super::VolumeControlView;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumesView {
    /// Moves the whole group.
    pub group: VolumeControlView,
    /// The active player and each member on its own.
    pub players: Vec<VolumeControlView>,
}

pub fn render_volumes(store: &Store) -> VolumesView {
    let active = store.active_player();
    let config = store.config();
    let group_slider = VolumeSlider::for_player(active, config);

    VolumesView {
        group: VolumeControlView::new(active, &group_slider, true),
        players: active
            .group()
            .into_iter()
            .map(|player| {
                let slider = VolumeSlider::for_player(player, config);
                VolumeControlView::new(player, &slider, false)
            })
            .collect(),
    }
}
