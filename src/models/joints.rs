//! Conversion between a model's animation matrix and the robot joint runs the
//! game stores on disk.
//!
//! A robot keeps one `{offset, count}` descriptor per `(gun, state)` pair. Each
//! run lists the submodels that move with that gun, and every joint names its
//! own submodel, so the runs can be read back in any order.

use tracing::warn;

use crate::data::ham::{JointList, JointPos, Robot};
use crate::error::{ErrorKind, narrow};
use crate::models::polymodel::{MAX_GUNS, MAX_SUBMODELS, NUM_ANIMATION_STATES, Polymodel};

/// Fill `model.animation_matrix` from the joint runs referenced by `robot`.
///
/// `joint_at` resolves an absolute joint index; extension files address the
/// base file's joints through it. Returns the number of joints visited. The
/// model is flagged animated when that number is non-zero; cells for
/// submodels that no joint names are left untouched.
pub fn build_animation(
    robot: &Robot,
    model: &mut Polymodel,
    joint_at: impl Fn(usize) -> Option<JointPos>,
) -> usize {
    let mut mapping = [[None::<usize>; NUM_ANIMATION_STATES]; MAX_SUBMODELS];
    let mut visited = 0;

    for gun_states in robot.anim_states.iter() {
        for (state, list) in gun_states.iter().enumerate() {
            let Ok(offset) = usize::try_from(list.offset) else {
                continue;
            };
            let count = list.num_joints.max(0) as usize;
            for index in offset..offset + count {
                let Some(joint) = joint_at(index) else {
                    warn!("robot joint {index} is out of range");
                    continue;
                };
                visited += 1;
                match usize::try_from(joint.joint_num) {
                    Ok(submodel) if submodel < MAX_SUBMODELS => {
                        mapping[submodel][state] = Some(index);
                    }
                    _ => warn!("joint {index} names invalid submodel {}", joint.joint_num),
                }
            }
        }
    }

    if visited > 0 {
        model.is_animated = true;
    }

    for submodel in 1..MAX_SUBMODELS {
        for state in 0..NUM_ANIMATION_STATES {
            if let Some(joint) = mapping[submodel][state].and_then(&joint_at) {
                model.animation_matrix[submodel][state] = joint.angles;
            }
        }
    }

    visited
}

/// Assign every non-root submodel to a gun.
///
/// Each gun claims its submodel and all ancestors up to the root; later guns
/// win shared ancestors. Submodels that no gun claims go to the extra slot
/// `gun_count`. The root is never assigned.
fn assign_submodels_to_guns(model: &Polymodel) -> [Option<usize>; MAX_SUBMODELS] {
    let num_guns = model.gun_count();
    let num_submodels = model.num_submodels();
    let mut gun_nums = [None; MAX_SUBMODELS];
    for slot in gun_nums.iter_mut().take(num_submodels).skip(1) {
        *slot = Some(num_guns);
    }

    for gun in 0..num_guns {
        let Ok(mut submodel) = usize::try_from(model.gun_submodels[gun]) else {
            continue;
        };
        // bounded so a cyclic parent chain cannot hang the save
        for _ in 0..MAX_SUBMODELS {
            if submodel == 0 || submodel >= num_submodels {
                break;
            }
            gun_nums[submodel] = Some(gun);
            match model.parent_of(submodel) {
                Some(parent) => submodel = parent,
                None => break,
            }
        }
    }

    gun_nums
}

/// Drop every joint run `robot` refers to, leaving it gunless and
/// unanimated.
pub fn clear_joint_runs(robot: &mut Robot) {
    robot.num_guns = 0;
    robot.anim_states = [[JointList::default(); NUM_ANIMATION_STATES]; MAX_GUNS + 1];
}

/// Regenerate `robot`'s gun configuration and joint runs from `model`,
/// appending the joints to `joints`.
///
/// Run offsets are absolute: `joint_base + joints.len()` at the time each run
/// starts. Runs are emitted gun by gun, state by state, submodels in index
/// order. A model that is not animated emits nothing and leaves every
/// descriptor zeroed. Fails if an offset no longer fits the descriptor.
pub fn flatten_animation(
    robot: &mut Robot,
    model: &Polymodel,
    joints: &mut Vec<JointPos>,
    joint_base: usize,
) -> Result<(), ErrorKind> {
    clear_joint_runs(robot);
    robot.num_guns = model.gun_count() as i8;
    for gun in 0..MAX_GUNS {
        robot.gun_points[gun] = model.gun_points[gun];
        robot.gun_submodels[gun] = model.gun_submodels[gun].clamp(0, u8::MAX as i32) as u8;
    }

    if !model.is_animated {
        return Ok(());
    }

    let gun_nums = assign_submodels_to_guns(model);
    for gun in 0..=model.gun_count() {
        for state in 0..NUM_ANIMATION_STATES {
            let list = &mut robot.anim_states[gun][state];
            list.offset = narrow("robot joint", joint_base + joints.len())?;
            for (submodel, owner) in gun_nums.iter().enumerate() {
                if *owner == Some(gun) {
                    joints.push(JointPos {
                        joint_num: submodel as i16,
                        angles: model.animation_matrix[submodel][state],
                    });
                    list.num_joints += 1;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game_types::FixAngles;
    use crate::models::polymodel::Submodel;

    fn submodel(parent: i32) -> Submodel {
        Submodel {
            parent,
            ..Default::default()
        }
    }

    /// root, 1 <- 0, 2 <- 1, 3 <- 0; gun 0 on submodel 2.
    fn gun_arm_model() -> Polymodel {
        let mut model = Polymodel {
            submodels: vec![submodel(-1), submodel(0), submodel(1), submodel(0)],
            num_guns: 1,
            is_animated: true,
            ..Default::default()
        };
        model.gun_submodels[0] = 2;
        for m in 1..4 {
            for state in 0..NUM_ANIMATION_STATES {
                model.animation_matrix[m][state] =
                    FixAngles::new(m as i16 * 100, state as i16, -(m as i16));
            }
        }
        model
    }

    #[test]
    fn runs_follow_gun_then_state_order() {
        let model = gun_arm_model();
        let mut robot = Robot::default();
        let mut joints = Vec::new();
        flatten_animation(&mut robot, &model, &mut joints, 0).unwrap();

        assert_eq!(joints.len(), 15);
        for state in 0..NUM_ANIMATION_STATES {
            assert_eq!(
                robot.anim_states[0][state],
                JointList {
                    num_joints: 2,
                    offset: (state * 2) as i16
                }
            );
            assert_eq!(
                robot.anim_states[1][state],
                JointList {
                    num_joints: 1,
                    offset: (10 + state) as i16
                }
            );
        }
        assert_eq!(joints[0].joint_num, 1);
        assert_eq!(joints[1].joint_num, 2);
        assert_eq!(joints[10].joint_num, 3);
        assert_eq!(joints[3].angles, model.animation_matrix[2][1]);
        assert_eq!(robot.num_guns, 1);
        assert_eq!(robot.gun_submodels[0], 2);
    }

    #[test]
    fn offsets_continue_a_running_counter() {
        let model = gun_arm_model();
        let mut first = Robot::default();
        let mut second = Robot::default();
        let mut joints = Vec::new();
        flatten_animation(&mut first, &model, &mut joints, 0).unwrap();
        flatten_animation(&mut second, &model, &mut joints, 0).unwrap();
        assert_eq!(second.anim_states[0][0].offset, 15);

        let mut ext = Robot::default();
        let mut ext_joints = Vec::new();
        flatten_animation(&mut ext, &model, &mut ext_joints, 1145).unwrap();
        assert_eq!(ext.anim_states[0][0].offset, 1145);
        assert_eq!(ext.anim_states[1][4].offset, 1145 + 14);
    }

    #[test]
    fn flatten_then_build_reproduces_matrix() {
        let model = gun_arm_model();
        let mut robot = Robot::default();
        let mut joints = Vec::new();
        flatten_animation(&mut robot, &model, &mut joints, 0).unwrap();

        let mut rebuilt = Polymodel {
            submodels: model.submodels.clone(),
            ..Default::default()
        };
        let visited = build_animation(&robot, &mut rebuilt, |i| joints.get(i).copied());
        assert_eq!(visited, 15);
        assert!(rebuilt.is_animated);
        assert_eq!(rebuilt.animation_matrix, model.animation_matrix);
        assert_eq!(rebuilt.animation_matrix[5][0], FixAngles::default());
    }

    #[test]
    fn unanimated_model_emits_nothing() {
        let mut model = gun_arm_model();
        model.is_animated = false;
        let mut robot = Robot::default();
        robot.anim_states[3][2] = JointList {
            num_joints: 4,
            offset: 9,
        };
        let mut joints = Vec::new();
        flatten_animation(&mut robot, &model, &mut joints, 0).unwrap();

        assert!(joints.is_empty());
        assert!(
            robot
                .anim_states
                .iter()
                .flatten()
                .all(|list| *list == JointList::default())
        );
    }

    #[test]
    fn build_skips_bad_joints() {
        let mut robot = Robot::default();
        robot.anim_states[0][0] = JointList {
            num_joints: 3,
            offset: 0,
        };
        let joints = [
            JointPos {
                joint_num: 1,
                angles: FixAngles::new(7, 7, 7),
            },
            JointPos {
                joint_num: 40,
                angles: FixAngles::new(1, 1, 1),
            },
        ];
        let mut model = Polymodel::default();
        let visited = build_animation(&robot, &mut model, |i| joints.get(i).copied());
        assert_eq!(visited, 2);
        assert_eq!(model.animation_matrix[1][0], FixAngles::new(7, 7, 7));
    }

    #[test]
    fn later_gun_claims_shared_parent() {
        let mut model = gun_arm_model();
        model.submodels.push(submodel(1));
        model.num_guns = 2;
        model.gun_submodels[1] = 4;
        let gun_nums = assign_submodels_to_guns(&model);
        assert_eq!(gun_nums[0], None);
        assert_eq!(gun_nums[1], Some(1));
        assert_eq!(gun_nums[2], Some(0));
        assert_eq!(gun_nums[3], Some(2));
        assert_eq!(gun_nums[4], Some(1));
    }

    #[test]
    fn offsets_past_the_descriptor_width_fail() {
        let model = gun_arm_model();
        let mut robot = Robot::default();
        let mut joints = Vec::new();
        let result = flatten_animation(&mut robot, &model, &mut joints, i16::MAX as usize);
        assert!(matches!(result, Err(ErrorKind::TableOverflow { .. })));
    }

    #[test]
    fn cleared_robot_refers_to_no_joints() {
        let mut robot = Robot {
            num_guns: 2,
            ..Default::default()
        };
        robot.anim_states[1][3] = JointList {
            num_joints: 3,
            offset: 40,
        };
        clear_joint_runs(&mut robot);
        assert_eq!(robot.num_guns, 0);
        assert!(robot.anim_states.iter().flatten().all(|list| *list == JointList::default()));
    }
}
