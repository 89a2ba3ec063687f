//! Reusable model sources.
//!
//! - [`MARS_ROVER`]: the simple Mars rover benchmark with the `pics3`
//!   non-fluents and a 40-epoch instance.
//! - [`MARS_ROVER_TRACKED`]: the same rover with per-picture bookkeeping
//!   (a parameterized state-fluent, a derived fluent, an enumeration
//!   type, action preconditions and state invariants).

/// Simple Mars rover: continuous x/y movement with distance-proportional
/// noise, a clock, and reward for snapping pictures inside error boxes.
pub const MARS_ROVER: &str = r#"
////////////////////////////////////////////////////////////////////
// Simple Mars rover. The rover moves in the plane and is rewarded
// for pictures taken inside a picture point's error box before
// MAX_TIME runs out.
////////////////////////////////////////////////////////////////////

domain simple_mars_rover {

    requirements = {
        concurrent,           // x and y moves happen simultaneously
        reward-deterministic, // reward has no distribution nodes
        constrained-state     // state-action constraints are present
    };

    types {
        picture-point : object;
    };

    pvariables {
        // Problem constants
        MAX_TIME : { non-fluent, real, default = 12.0 };

        // Movement noise grows with distance travelled
        MOVE_VARIANCE_MULT : { non-fluent, real, default = 0.1 };

        // Each picture has a location, value and error box half-width
        PICT_XPOS(picture-point)        : { non-fluent, real, default = 0.0 };
        PICT_YPOS(picture-point)        : { non-fluent, real, default = 0.0 };
        PICT_VALUE(picture-point)       : { non-fluent, real, default = 1.0 };
        PICT_ERROR_ALLOW(picture-point) : { non-fluent, real, default = 0.5 };

        // Rover state
        xPos : { state-fluent, real, default = 0.0 };
        yPos : { state-fluent, real, default = 0.0 };
        time : { state-fluent, real, default = 0.0 };

        // Rover actions
        xMove       : { action-fluent, real, default = 0.0 };
        yMove       : { action-fluent, real, default = 0.0 };
        snapPicture : { action-fluent, bool, default = false };
    };

    cpfs {
        // No abs() in the language: flip the sign with a conditional.
        xPos' = Normal(xPos + xMove, MOVE_VARIANCE_MULT * [if (xMove > 0) then xMove else -xMove]);
        yPos' = Normal(yPos + yMove, MOVE_VARIANCE_MULT * [if (yMove > 0) then yMove else -yMove]);

        // Taking a picture costs a quarter time unit, moving costs the
        // Manhattan distance.
        time' = if (snapPicture)
                    then DiracDelta(time + 0.25)
                    else DiracDelta(time
                        + [if (xMove > 0) then xMove else -xMove]
                        + [if (yMove > 0) then yMove else -yMove]);
    };

    reward = if (snapPicture ^ (time <= MAX_TIME))
                then sum_{?p : picture-point} [
                    if ((xPos >= PICT_XPOS(?p) - PICT_ERROR_ALLOW(?p))
                      ^ (xPos <= PICT_XPOS(?p) + PICT_ERROR_ALLOW(?p))
                      ^ (yPos >= PICT_YPOS(?p) - PICT_ERROR_ALLOW(?p))
                      ^ (yPos <= PICT_YPOS(?p) + PICT_ERROR_ALLOW(?p)))
                    then PICT_VALUE(?p)
                    else 0.0
                ]
                else 0.0;

    state-action-constraints {
        // Cannot snap a picture and move at the same time
        snapPicture => ((xMove == 0.0) ^ (yMove == 0.0));

        // Moves are bounded
        (xMove >= -5.0) ^ (xMove <= 5.0);
        (yMove >= -5.0) ^ (yMove <= 5.0);
    };
}

non-fluents pics3 {
    domain = simple_mars_rover;

    objects {
        picture-point : {p1, p2, p3};
    };

    non-fluents {
        PICT_XPOS(p1) = 1.0;   PICT_YPOS(p1) = -1.0;  PICT_VALUE(p1) = 5.0;  PICT_ERROR_ALLOW(p1) = .5;
        PICT_XPOS(p2) = 1.0;   PICT_YPOS(p2) = 1.0;   PICT_VALUE(p2) = 10.0; PICT_ERROR_ALLOW(p2) = .2;  // tight box
        PICT_XPOS(p3) = 2.0;   PICT_YPOS(p3) = -1.0;  PICT_VALUE(p3) = 7.0;  PICT_ERROR_ALLOW(p3) = .75;
    };
}

instance inst_simple_mars_rover_pics3 {
    domain = simple_mars_rover;
    non-fluents = pics3;
    init-state {
        xPos = 0.0;
        yPos = 0.0;
        time = 0.0;
    };
    max-nondef-actions = pos-inf;
    horizon = 40;
    discount = 1.0;
}
"#;

/// Mars rover with per-picture bookkeeping: pictures pay out once.
pub const MARS_ROVER_TRACKED: &str = r#"
domain tracked_mars_rover {
    requirements = { concurrent, intermediate-nodes, constrained-state };

    types {
        picture-point : object;
        rover-phase   : {@idle, @moving, @imaging};
    };

    pvariables {
        MAX_TIME : { non-fluent, real, default = 12.0 };
        PICT_XPOS(picture-point)        : { non-fluent, real, default = 0.0 };
        PICT_YPOS(picture-point)        : { non-fluent, real, default = 0.0 };
        PICT_VALUE(picture-point)       : { non-fluent, real, default = 1.0 };
        PICT_ERROR_ALLOW(picture-point) : { non-fluent, real, default = 0.5 };

        inBox(picture-point) : { interm-fluent, bool, level = 1 };
        boxCount             : { derived-fluent, int };

        xPos : { state-fluent, real, default = 0.0 };
        yPos : { state-fluent, real, default = 0.0 };
        time : { state-fluent, real, default = 0.0 };
        picTaken(picture-point) : { state-fluent, bool, default = false };
        phase : { state-fluent, rover-phase, default = @idle };

        xMove       : { action-fluent, real, default = 0.0 };
        yMove       : { action-fluent, real, default = 0.0 };
        snapPicture : { action-fluent, bool, default = false };
    };

    cpfs {
        inBox(?p) = (xPos >= PICT_XPOS(?p) - PICT_ERROR_ALLOW(?p))
                  ^ (xPos <= PICT_XPOS(?p) + PICT_ERROR_ALLOW(?p))
                  ^ (yPos >= PICT_YPOS(?p) - PICT_ERROR_ALLOW(?p))
                  ^ (yPos <= PICT_YPOS(?p) + PICT_ERROR_ALLOW(?p));

        boxCount = sum_{?p : picture-point} [if (inBox(?p)) then 1 else 0];

        xPos' = xPos + xMove;
        yPos' = yPos + yMove;
        time' = if (snapPicture) then time + 0.25
                else time + [if (xMove > 0) then xMove else -xMove]
                          + [if (yMove > 0) then yMove else -yMove];

        picTaken'(?p) = picTaken(?p) | (snapPicture ^ inBox(?p));

        phase' = if (snapPicture) then @imaging
                 else if ((xMove == 0.0) ^ (yMove == 0.0)) then @idle
                 else @moving;
    };

    reward = if (snapPicture ^ (time <= MAX_TIME))
                then sum_{?p : picture-point} [if (inBox(?p) ^ ~picTaken(?p)) then PICT_VALUE(?p) else 0.0]
                else 0.0;

    action-preconditions {
        snapPicture => ((xMove == 0.0) ^ (yMove == 0.0));
    };

    state-invariants {
        time >= 0.0;
    };
}

non-fluents pics3_tracked {
    domain = tracked_mars_rover;
    objects {
        picture-point : {p1, p2, p3};
    };
    non-fluents {
        PICT_XPOS(p1) = 1.0;  PICT_YPOS(p1) = -1.0; PICT_VALUE(p1) = 5.0;  PICT_ERROR_ALLOW(p1) = 0.5;
        PICT_XPOS(p2) = 1.0;  PICT_YPOS(p2) = 1.0;  PICT_VALUE(p2) = 10.0; PICT_ERROR_ALLOW(p2) = 0.2;
        PICT_XPOS(p3) = 2.0;  PICT_YPOS(p3) = -1.0; PICT_VALUE(p3) = 7.0;  PICT_ERROR_ALLOW(p3) = 0.75;
    };
}

instance inst_tracked_pics3 {
    domain = tracked_mars_rover;
    non-fluents = pics3_tracked;
    init-state {
        xPos = 1.0;
        yPos = 1.0;
        ~picTaken(p1);
    };
    max-nondef-actions = 2;
    horizon = 5;
    discount = 0.9;
}
"#;

/// [`MARS_ROVER`] with the instance horizon replaced.
pub fn mars_rover_with_horizon(horizon: u32) -> String {
    MARS_ROVER.replace("horizon = 40;", &format!("horizon = {horizon};"))
}
