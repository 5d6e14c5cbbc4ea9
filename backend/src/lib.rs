//! # Estate Gate Console Backend
//!
//! Core of the estate gate-pass scan console.
//!
//! This crate classifies scanned or typed pass codes, drives the scan console
//! through check-in/check-out and visitor selection, and turns a visitor's
//! per-gate statuses into a clearance timeline. An axum service exposes the
//! same core to a console frontend.
//!
//! ## Features
//!
//! - **Pass Code Resolver**: normalize and classify codes into a dispatch decision
//! - **Gate Console**: reducer-style scan session plus an async effect driver
//! - **Gate Clearance**: dependency-gate map to main path and branches
//! - **Gateways**: in-memory and upstream HTTP implementations of the estate API
//! - **HTTP API**: RESTful endpoints for frontend integration
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Data Transfer Objects (DTOs) for API responses
//! - [`models`]: Contract types exchanged with the estate API
//! - [`routes`]: Upstream routes and their request bodies
//! - [`services`]: Resolver, console state machine and clearance builder
//! - [`gateway`]: Estate API collaborators, configuration and factory
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - GatewayError carries the upstream body and context
#![allow(clippy::result_large_err)]

pub mod api;

pub mod gateway;
pub mod models;

pub mod routes;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
