//! Sport command names accepted by `POST /api/cmd`.
//!
//! The table mirrors the backend driver verbatim, collisions included:
//! `CrossStep` is listed twice with different codes and `LeadFollow` shares
//! 1045 with `FreeWalk`. Lookups resolve duplicates to the last entry.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SportCommand {
    pub name: &'static str,
    pub code: u16,
}

const fn cmd(name: &'static str, code: u16) -> SportCommand {
    SportCommand { name, code }
}

pub const SPORT_COMMANDS: &[SportCommand] = &[
    cmd("Damp", 1001),
    cmd("BalanceStand", 1002),
    cmd("StopMove", 1003),
    cmd("StandUp", 1004),
    cmd("StandDown", 1005),
    cmd("RecoveryStand", 1006),
    cmd("Euler", 1007),
    cmd("Move", 1008),
    cmd("Sit", 1009),
    cmd("RiseSit", 1010),
    cmd("SwitchGait", 1011),
    cmd("Trigger", 1012),
    cmd("BodyHeight", 1013),
    cmd("FootRaiseHeight", 1014),
    cmd("SpeedLevel", 1015),
    cmd("Hello", 1016),
    cmd("Stretch", 1017),
    cmd("TrajectoryFollow", 1018),
    cmd("ContinuousGait", 1019),
    cmd("Content", 1020),
    cmd("Wallow", 1021),
    cmd("Dance1", 1022),
    cmd("Dance2", 1023),
    cmd("GetBodyHeight", 1024),
    cmd("GetFootRaiseHeight", 1025),
    cmd("GetSpeedLevel", 1026),
    cmd("SwitchJoystick", 1027),
    cmd("Pose", 1028),
    cmd("Scrape", 1029),
    cmd("FrontFlip", 1030),
    cmd("FrontJump", 1031),
    cmd("FrontPounce", 1032),
    cmd("WiggleHips", 1033),
    cmd("GetState", 1034),
    cmd("EconomicGait", 1035),
    cmd("FingerHeart", 1036),
    cmd("Handstand", 1301),
    cmd("CrossStep", 1302),
    cmd("OnesidedStep", 1303),
    cmd("Bound", 1304),
    cmd("LeadFollow", 1045),
    cmd("LeftFlip", 1042),
    cmd("RightFlip", 1043),
    cmd("Backflip", 1044),
    cmd("FreeWalk", 1045),
    cmd("FreeBound", 1046),
    cmd("FreeJump", 1047),
    cmd("FreeAvoid", 1048),
    cmd("WalkStair", 1049),
    cmd("WalkUpright", 1050),
    cmd("CrossStep", 1051),
];

pub fn lookup(name: &str) -> Option<SportCommand> {
    SPORT_COMMANDS
        .iter()
        .rev()
        .find(|command| command.name == name)
        .copied()
}

pub fn is_known(name: &str) -> bool {
    lookup(name).is_some()
}

/// Unique command names in table order.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::with_capacity(SPORT_COMMANDS.len());
    for command in SPORT_COMMANDS {
        if !names.contains(&command.name) {
            names.push(command.name);
        }
    }
    names
}
