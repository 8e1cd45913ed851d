//! The built-in message records.

use crate::message_record;
use crate::time::Time;

message_record! {
    /// Sequencing and frame metadata carried by most records.
    pub struct Header : "plan_msgs/Header" {
        stamp: Time,
        frame_id: String,
    }
}

message_record! {
    /// A bound on one joint of the planning group.
    pub struct JointConstraint : "plan_msgs/JointConstraint" {
        joint_name: String,
        position: f64,
        tolerance_above: f64,
        tolerance_below: f64,
        weight: f64,
    }
}

message_record! {
    /// A named, described, stringly-typed parameter.
    pub struct Property : "plan_msgs/Property" {
        name: String,
        description: String,
        value: String,
    }
}

message_record! {
    /// A planning request: nested record, record sequence and timestamp in
    /// one place.
    pub struct MotionPlanRequest : "plan_msgs/MotionPlanRequest" {
        header: Header,
        group_name: String,
        joint_constraints: Vec<JointConstraint>,
        allowed_planning_time: f64,
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    use td_codec::{DomainObject, Value};

    #[test]
    fn fields_read_and_write_by_name() {
        let mut c = JointConstraint::default();
        c.set_field("joint_name", Value::Str("elbow".into())).unwrap();
        c.set_field("position", Value::Float(1.25)).unwrap();
        assert_eq!(c.get_field("joint_name").unwrap(), Value::Str("elbow".into()));
        assert_eq!(c.position, 1.25);

        let err = c.set_field("torque", Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type `plan_msgs/JointConstraint` has no field `torque`"
        );
    }

    #[test]
    fn nested_records_convert_as_objects() {
        let header = Header {
            stamp: Time::new(5, 250),
            frame_id: "world".into(),
        };
        let mut request = MotionPlanRequest::default();
        request
            .set_field("header", header.to_value())
            .unwrap();
        assert_eq!(request.header, header);
    }

    #[test]
    fn record_equality_is_field_wise() {
        let a = Property {
            name: "speed".into(),
            description: "max velocity".into(),
            value: "0.5".into(),
        };
        let b = a.clone();
        assert!(DomainObject::object_eq(&a, &b));

        let mut c = a.clone();
        c.value = "0.6".into();
        assert!(!DomainObject::object_eq(&a, &c));
    }

    #[test]
    fn field_names_preserve_declaration_order() {
        let request = MotionPlanRequest::default();
        assert_eq!(
            request.field_names(),
            &[
                "header",
                "group_name",
                "joint_constraints",
                "allowed_planning_time"
            ]
        );
    }
}
