//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, catalog ids, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user name
pub const TEST_USER: &str = "testuser";

/// Regular test user password
pub const TEST_PASS: &str = "testpass123";

/// Admin test user name
pub const ADMIN_USER: &str = "admin";

/// Admin test user password
pub const ADMIN_PASS: &str = "adminpass123";

// ============================================================================
// Test Catalog
// ============================================================================

/// "Opening Track" by The Test Band, tagged Indie and Rock
pub const TRACK_1_ID: i64 = 1;

/// "Middle Track" by The Test Band, tagged Rock
pub const TRACK_2_ID: i64 = 2;

/// "Closing Track" by The Test Band, tagged Indie
pub const TRACK_3_ID: i64 = 3;

/// "Smooth Jazz" by Jazz Ensemble, tagged Jazz
pub const TRACK_4_ID: i64 = 4;

/// "Upbeat Jazz" by Jazz Ensemble, tagged Jazz and Swing
pub const TRACK_5_ID: i64 = 5;

pub const TRACK_COUNT: usize = 5;

pub const ARTIST_1_NAME: &str = "The Test Band";
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";

/// A track id that is never created
pub const MISSING_TRACK_ID: i64 = 9999;

// ============================================================================
// Test Video Catalog
// ============================================================================

/// "Mixing Basics", category Tutorial
pub const VIDEO_1_ID: i64 = 1;

/// "Live at the Park", category Performance
pub const VIDEO_2_ID: i64 = 2;

/// "Mastering Walkthrough", category Tutorial
pub const VIDEO_3_ID: i64 = 3;

pub const VIDEO_COUNT: usize = 3;

/// A video id that is never created
pub const MISSING_VIDEO_ID: i64 = 9999;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Timeout for a single HTTP request
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
