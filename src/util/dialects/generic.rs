use crate::engine::dialect::{Capabilities, DialectKind, SqlDialect};

/// ANSI-flavoured dialect whose capability table is supplied by the caller.
#[derive(Debug, Default, Clone)]
pub struct GenericDialect {
    capabilities: Capabilities,
}

impl GenericDialect {
    pub fn new(capabilities: Capabilities) -> Self {
        GenericDialect { capabilities }
    }
}

impl SqlDialect for GenericDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Generic
    }

    fn name(&self) -> &'static str {
        "Generic"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}
