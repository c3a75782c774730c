use crate::{
    FuseTable,
    config::{GlobalTableInitializedError, TableConfig},
};

#[cfg(feature = "std")]
type OnceImpl<T> = std::sync::OnceLock<T>;

#[cfg(not(feature = "std"))]
type OnceImpl<T> = spin::Once<T>;

static GLOBAL: GlobalLock = GlobalLock(OnceImpl::new());

#[repr(transparent)]
struct GlobalLock(OnceImpl<FuseTable>);

impl GlobalLock {
    #[inline]
    fn get_or_init(&'static self, init: impl FnOnce() -> FuseTable) -> &'static FuseTable {
        #[cfg(feature = "std")]
        let table = self.0.get_or_init(init);

        #[cfg(not(feature = "std"))]
        let table = self.0.call_once(init);

        table
    }
}

pub(crate) fn table() -> &'static FuseTable {
    GLOBAL.get_or_init(FuseTable::new)
}

pub(crate) fn install(config: TableConfig) -> Result<(), GlobalTableInitializedError> {
    let mut installed = false;
    GLOBAL.get_or_init(|| {
        installed = true;
        tracing::debug!(?config, "installing global fuse table");
        FuseTable::with_config(config)
    });

    if installed {
        Ok(())
    } else {
        Err(GlobalTableInitializedError(config))
    }
}
