pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod handlers {
    pub mod auth;
    pub mod fallback;
    pub mod health;
    pub mod index;
    pub mod session;
    pub mod setting;
    pub mod status;

    #[cfg(test)]
    pub(crate) mod test_support;
}

pub mod models {
    pub mod user;
}

pub mod stores {
    pub mod picture_store;
    pub mod session_store;
    pub mod user_store;
}

pub mod utils {
    pub mod cookie;
    pub mod password;
    pub mod time;
}

pub mod validation {
    pub mod forms;
    pub mod rules;
}

pub mod views {
    pub mod layout;
    pub mod pages;
}

pub mod wal {
    pub mod wal;
}
