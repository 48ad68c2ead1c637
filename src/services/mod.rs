pub mod collect;
pub mod cumulative;
pub mod locate;
pub mod resolver;
pub mod timeline;

pub use collect::collect;
pub use cumulative::cumulative;
pub use locate::locate_first_appearance;
pub use resolver::{resolve_last_event, ProbeConfig};
pub use timeline::{
    pad_single_sample, FacadePhase, FacadeState, TimelineFacade, TimelineQuery,
};
