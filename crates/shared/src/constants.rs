// Tick rate
pub const TICK_RATE: u32 = 50;
pub const DT: f32 = 1.0 / TICK_RATE as f32;

// Roster
pub const MAX_AGENTS: usize = 10; // observation is always shaped for 10 slots
pub const MIN_AGENTS: usize = 2;

// Observation layout
pub const SELF_OBS_SIZE: usize = 8;
pub const BOUNDARY_SLOT_SIZE: usize = 6;
pub const OTHER_SLOT_SIZE: usize = 12;
pub const OTHER_SLOTS: usize = MAX_AGENTS - 1;

// Actions: pitch, yaw, roll, throttle, fire
pub const ACTION_SIZE: usize = 5;
pub const ACTION_BRANCHES: [u8; ACTION_SIZE] = [3, 3, 3, 2, 2];

// Aircraft
pub const THRUST: f32 = 25.0;
pub const BOOST_MULTIPLIER: f32 = 5.0;
pub const MASS: f32 = 1.0;
pub const LINEAR_DRAG: f32 = 0.5;
pub const PITCH_SPEED_DEG: f32 = 30.0;
pub const YAW_SPEED_DEG: f32 = 30.0;
pub const ROLL_SPEED_DEG: f32 = 30.0;
pub const CONTROL_RAMP_RATE: f32 = 2.0; // smoothed input units per second
pub const AGENT_RADIUS: f32 = 5.0;
pub const MUZZLE_OFFSET: f32 = AGENT_RADIUS + 2.0;

// Gun
pub const INITIAL_AMMUNITION: u32 = 1000;
pub const FIRE_INTERVAL_SECS: f32 = 0.1;
pub const FIRE_CONE_DEG: f32 = 10.0;

// Projectiles
pub const BULLET_SPEED: f32 = 1000.0;
pub const BULLET_LIFETIME_SECS: f32 = 7.0;
pub const BULLET_RADIUS: f32 = 1.0;

// Built-in policies
pub const TURN_GATE_SECS: f32 = 0.1;
pub const BOUNDARY_AVOID_DISTANCE: f32 = 35.0;

// Potential field gains
pub const FIELD_SPRING_GAIN: f32 = 0.01;
pub const FIELD_REPULSE_GAIN: f32 = 2_000.0;
pub const FIELD_BOUNDARY_GAIN: f32 = 4_000.0;
pub const FIELD_NOSE_OFFSET: f32 = 40.0;
pub const FIELD_NOSE_GAIN: f32 = 3_000.0;
pub const FIELD_TAIL_GAIN: f32 = 0.5;
pub const FIELD_MIN_DISTANCE: f32 = 1.0;
pub const FIELD_BOOST_RANGE: f32 = 150.0;

// Spawning
pub const SPAWN_JITTER: f32 = 10.0;

// Rewards
pub const HIT_REWARD: f32 = 10.0;
pub const FRIENDLY_FIRE_PENALTY: f32 = -10.0;
pub const DESTROYED_PENALTY: f32 = -10.0;
pub const EMPTY_MAGAZINE_PENALTY: f32 = -0.5;
pub const WIN_REWARD: f32 = 10.0;
pub const LOSE_REWARD: f32 = -10.0;
pub const DRAW_REWARD: f32 = -5.0;

// Match flow
pub const EVALUATION_INTERVAL_SECS: f32 = 0.1;
pub const RESULT_PAUSE_SECS: f32 = 2.0;
pub const RESUME_SETTLE_SECS: f32 = 1.0;
pub const TRAINING_MAX_STEPS: u32 = 5000;

// Default arena (cube centred on the origin)
pub const ARENA_HALF_EXTENT: f32 = 300.0;
pub const SPAWN_ANCHOR_OFFSET: f32 = 150.0;
