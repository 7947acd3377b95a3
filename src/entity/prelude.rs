//! 预导入模块，方便使用

pub use super::batch_students::{
    ActiveModel as BatchStudentActiveModel, Entity as BatchStudents, Model as BatchStudentModel,
};
pub use super::batches::{ActiveModel as BatchActiveModel, Entity as Batches, Model as BatchModel};
pub use super::classes::{ActiveModel as ClassActiveModel, Entity as Classes, Model as ClassModel};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
