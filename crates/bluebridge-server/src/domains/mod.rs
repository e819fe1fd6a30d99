pub mod errors;

pub mod auth {
    pub mod core;
    pub mod service;
    pub mod http {
        pub mod v1;
    }
}

pub mod bugreports {
    pub mod service;
    pub mod http {
        pub mod v1;
    }
}

pub mod nearby {
    pub mod service;
    pub mod http {
        pub mod v1;
    }
}

pub mod notifications {
    pub mod service;
    pub mod http {
        pub mod v1;
    }
}

pub mod statistics {
    pub mod service;
    pub mod http {
        pub mod v1;
    }
}

pub mod system {
    pub mod http {
        pub mod v1;
    }
}

pub mod weather {
    pub mod service;
    pub mod http {
        pub mod v1;
    }
}

pub mod wells {
    pub mod service;
    pub mod http {
        pub mod v1;
    }
}
