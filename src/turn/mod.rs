mod processor;

pub use processor::{
    run_listener, AccumulationMode, ListenerExit, TurnOutcome, TurnProcessor, TurnState,
};
