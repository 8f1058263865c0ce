mod event;
mod sink;

pub use event::{
    Event, PayloadNodeDeselect, PayloadNodeSelect, PayloadPan, PayloadSpeed, PayloadStep,
    PayloadZoom,
};

pub use sink::EventSink;
