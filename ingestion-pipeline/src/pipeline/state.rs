use state_machines::state_machine;

state_machine! {
    name: CourseMachine,
    state: CourseState,
    initial: Ready,
    states: [Ready, VideoLoaded, ChunksStored, Retrieved, Generated, Persisted, Failed],
    events {
        load { transition: { from: Ready, to: VideoLoaded } }
        store_chunks { transition: { from: VideoLoaded, to: ChunksStored } }
        retrieve { transition: { from: ChunksStored, to: Retrieved } }
        generate { transition: { from: Retrieved, to: Generated } }
        persist { transition: { from: Generated, to: Persisted } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: VideoLoaded, to: Failed }
            transition: { from: ChunksStored, to: Failed }
            transition: { from: Retrieved, to: Failed }
            transition: { from: Generated, to: Failed }
            transition: { from: Persisted, to: Failed }
        }
    }
}

pub fn ready() -> CourseMachine<(), Ready> {
    CourseMachine::new(())
}
