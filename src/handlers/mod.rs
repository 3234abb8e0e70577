//! HTTP and WebSocket request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Debate lifecycle, scores, and player stats over HTTP
//! - `ws` - WebSocket real-time voice exchange

pub mod api;
pub mod ws;

// Re-export commonly used handlers for convenient access
pub use ws::ws_debate_handler;
