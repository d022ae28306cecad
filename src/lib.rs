//! Crisper core: the credential-lifecycle and request-gating boundary around
//! AI recipe generation.
//!
//! The server side exposes two gated proxy endpoints that hold the real
//! upstream credential; the client side provides an encrypted, self-expiring
//! session credential store and a router that picks the direct or proxied
//! upstream path once at startup.

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub mod crypto {
    pub mod aes;
    pub mod session;
}

pub mod keystore {
    pub mod storage;
    pub mod store;
}

pub mod gate {
    pub mod origin;
    pub mod quota;
}

pub mod models {
    pub mod recipe;
}

pub mod upstream {
    pub mod gemini;
}

pub mod services {
    pub mod normalize;
    pub mod router;
}

pub mod handlers {
    pub mod proxy;
}

pub mod middleware_layer {
    pub mod gate;
}

pub mod validation {
    pub mod recipe;
}
