//! Hand-landmark types shared by the service and its detector backends.
//!
//! A detected hand is a fixed, ordered list of 21 keypoints following the
//! common hand-landmark model convention (wrist first, then four joints per
//! finger). `HAND_CONNECTIONS` is the constant edge list used to draw the
//! skeleton; the same table applies to every detection.

pub mod detector;

use serde::Serialize;

/// Index constants for the 21 hand landmarks.
pub mod landmark_index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Number of keypoints per detected hand.
pub const LANDMARK_COUNT: usize = 21;

/// Skeleton edge list: (start, end) landmark index pairs connected by a
/// drawn bone. Palm edges first, then one chain per finger.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    // palm
    (0, 1),
    (0, 5),
    (5, 9),
    (9, 13),
    (13, 17),
    (0, 17),
    // thumb
    (1, 2),
    (2, 3),
    (3, 4),
    // index finger
    (5, 6),
    (6, 7),
    (7, 8),
    // middle finger
    (9, 10),
    (10, 11),
    (11, 12),
    // ring finger
    (13, 14),
    (14, 15),
    (15, 16),
    // pinky
    (17, 18),
    (18, 19),
    (19, 20),
];

/// One keypoint position, normalized to image dimensions. `z` is depth
/// relative to the wrist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Which hand a detection belongs to, when the model reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Handedness {
    Left,
    Right,
    Unknown,
}

/// A single detected hand: 21 ordered keypoints plus a confidence score.
/// Immutable once produced by the detector.
#[derive(Clone, Debug, Serialize)]
pub struct HandDetection {
    pub landmarks: [Landmark; LANDMARK_COUNT],
    pub score: f32,
    pub handedness: Handedness,
}
