//! 审批流集成测试
//!
//! 使用临时目录下的真实 SQLite 数据库，在服务层完整走一遍
//! draft → pending_team_leader → pending_center_director → 终态 的流水线，
//! 覆盖批量上报的事务语义和同一订单上的并发审批。

use std::io::Cursor;

use approval_server::db::DbService;
use approval_server::db::models::{Decision, OrderCreate, OrderStatus, OrderUpdate, Role};
use approval_server::db::repository::{DepartmentRepository, MemberRepository};
use approval_server::services::{ApprovalService, ImageStore, OrderService};
use approval_server::{AppError, CurrentUser};
use sqlx::SqlitePool;

/// 测试环境：临时工作目录 + 两个部门 + 各角色成员
struct TestEnv {
    _dir: tempfile::TempDir,
    pool: SqlitePool,
    images: ImageStore,
    employee: CurrentUser,
    leader: CurrentUser,
    leader_b: CurrentUser,
    director: CurrentUser,
}

impl TestEnv {
    async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("approval.db");
        let db = DbService::new(&db_path).await.expect("open database");
        let images = ImageStore::new(dir.path()).expect("image store");

        let departments = DepartmentRepository::new(db.pool.clone());
        let members = MemberRepository::new(db.pool.clone());

        let dept_a = departments.create("采购一部").await.expect("dept a");
        let dept_b = departments.create("采购二部").await.expect("dept b");

        let employee = members
            .create("zhang.wei", "张伟", "pw-zhang", Role::Employee, Some(&dept_a.id))
            .await
            .expect("employee");
        let leader = members
            .create("li.na", "李娜", "pw-li", Role::TeamLeader, Some(&dept_a.id))
            .await
            .expect("leader a");
        let leader_b = members
            .create("wang.fang", "王芳", "pw-wang", Role::TeamLeader, Some(&dept_b.id))
            .await
            .expect("leader b");
        let director = members
            .create("chen.jun", "陈军", "pw-chen", Role::CenterDirector, None)
            .await
            .expect("director");

        Self {
            _dir: dir,
            pool: db.pool,
            images,
            employee: current_user(&employee),
            leader: current_user(&leader),
            leader_b: current_user(&leader_b),
            director: current_user(&director),
        }
    }

    fn orders(&self) -> OrderService {
        OrderService::new(self.pool.clone(), self.images.clone())
    }

    fn approvals(&self) -> ApprovalService {
        ApprovalService::new(self.pool.clone())
    }
}

fn current_user(member: &approval_server::db::models::Member) -> CurrentUser {
    CurrentUser {
        id: member.id.clone(),
        username: member.username.clone(),
        display_name: member.display_name.clone(),
        role: member.role,
        department_id: member.department_id.clone(),
    }
}

fn payload(item_name: &str) -> OrderCreate {
    OrderCreate {
        item_name: item_name.to_string(),
        quantity: 2,
        price: 15900,
        comment: None,
    }
}

fn sample_png() -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(4, 4);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode sample image");
    buf
}

#[tokio::test]
async fn full_pipeline_approve_then_final_reject() {
    let env = TestEnv::new().await;
    let orders = env.orders();
    let approvals = env.approvals();

    let order = orders
        .create(&env.employee, payload("显示器"), None)
        .await
        .expect("create draft");
    assert_eq!(order.status, OrderStatus::Draft);

    let submitted = orders
        .submit(&env.employee, &[order.id.clone()])
        .await
        .expect("submit draft");
    assert_eq!(submitted, 1);

    // 团队领导批准，直接转入中心主任阶段
    let order = approvals
        .decide(&env.leader, &order.id, Decision::Approve, None)
        .await
        .expect("team leader approve");
    assert_eq!(order.status, OrderStatus::PendingCenterDirector);

    // 中心主任驳回，原因落库
    let order = approvals
        .decide(
            &env.director,
            &order.id,
            Decision::Reject,
            Some("超出本季度预算".to_string()),
        )
        .await
        .expect("director reject");
    assert_eq!(order.status, OrderStatus::Rejected);
    assert_eq!(order.reject_reason.as_deref(), Some("超出本季度预算"));

    // 终态订单不允许任何后续审批
    let err = approvals
        .decide(&env.director, &order.id, Decision::Approve, None)
        .await
        .expect_err("terminal order must not be decidable");
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn reject_requires_reason_and_approve_refuses_one() {
    let env = TestEnv::new().await;
    let orders = env.orders();
    let approvals = env.approvals();

    let order = orders
        .create(&env.employee, payload("碎纸机"), None)
        .await
        .expect("create draft");
    orders
        .submit(&env.employee, &[order.id.clone()])
        .await
        .expect("submit");

    let err = approvals
        .decide(&env.leader, &order.id, Decision::Reject, None)
        .await
        .expect_err("reject without reason");
    assert!(matches!(err, AppError::Validation(_)));

    let err = approvals
        .decide(&env.leader, &order.id, Decision::Reject, Some("   ".to_string()))
        .await
        .expect_err("blank reason is no reason");
    assert!(matches!(err, AppError::Validation(_)));

    let err = approvals
        .decide(
            &env.leader,
            &order.id,
            Decision::Approve,
            Some("不该有原因".to_string()),
        )
        .await
        .expect_err("approve with reason");
    assert!(matches!(err, AppError::Validation(_)));

    // 订单未被上面的失败触碰
    let detail = orders.detail(&env.leader, &order.id).await.expect("detail");
    assert_eq!(detail.order.status, OrderStatus::PendingTeamLeader);
}

#[tokio::test]
async fn team_leader_cannot_decide_another_department() {
    let env = TestEnv::new().await;
    let orders = env.orders();
    let approvals = env.approvals();

    let order = orders
        .create(&env.employee, payload("白板"), None)
        .await
        .expect("create draft");
    orders
        .submit(&env.employee, &[order.id.clone()])
        .await
        .expect("submit");

    let err = approvals
        .decide(&env.leader_b, &order.id, Decision::Approve, None)
        .await
        .expect_err("foreign department leader");
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn team_leader_own_drafts_skip_their_gate() {
    let env = TestEnv::new().await;
    let orders = env.orders();

    let order = orders
        .create(&env.leader, payload("投影仪"), None)
        .await
        .expect("leader draft");
    orders
        .submit(&env.leader, &[order.id.clone()])
        .await
        .expect("leader submit");

    let detail = orders.detail(&env.leader, &order.id).await.expect("detail");
    assert_eq!(detail.order.status, OrderStatus::PendingCenterDirector);
}

#[tokio::test]
async fn batch_submit_is_all_or_nothing() {
    let env = TestEnv::new().await;
    let orders = env.orders();

    let draft_a = orders
        .create(&env.employee, payload("订单A"), None)
        .await
        .expect("draft a");
    let draft_b = orders
        .create(&env.employee, payload("订单B"), None)
        .await
        .expect("draft b");
    let already = orders
        .create(&env.employee, payload("已上报"), None)
        .await
        .expect("draft c");
    orders
        .submit(&env.employee, &[already.id.clone()])
        .await
        .expect("pre-submit c");

    // 整批含一单非草稿：报错并指名违规订单，整批回滚
    let err = orders
        .submit(
            &env.employee,
            &[draft_a.id.clone(), already.id.clone(), draft_b.id.clone()],
        )
        .await
        .expect_err("batch with non-draft must fail");
    match err {
        AppError::InvalidTransition(msg) => assert!(msg.contains(&already.id)),
        other => panic!("unexpected error: {other:?}"),
    }

    for id in [&draft_a.id, &draft_b.id] {
        let detail = orders.detail(&env.employee, id).await.expect("detail");
        assert_eq!(detail.order.status, OrderStatus::Draft, "draft must stay untouched");
    }

    // 不存在的 ID 同样整批回滚
    let err = orders
        .submit(&env.employee, &[draft_a.id.clone(), "missing".to_string()])
        .await
        .expect_err("unknown id must fail");
    assert!(matches!(err, AppError::NotFound(_)));

    // 重复 ID 只处理一次
    let submitted = orders
        .submit(&env.employee, &[draft_a.id.clone(), draft_a.id.clone()])
        .await
        .expect("duplicate ids collapse");
    assert_eq!(submitted, 1);
}

#[tokio::test]
async fn batch_submit_rejects_foreign_orders() {
    let env = TestEnv::new().await;
    let orders = env.orders();

    let own = orders
        .create(&env.employee, payload("自己的草稿"), None)
        .await
        .expect("own draft");
    let foreign = orders
        .create(&env.leader_b, payload("别人的草稿"), None)
        .await
        .expect("foreign draft");

    // 整批含一单他人订单：报 Forbidden 并指名违规订单，整批回滚
    let err = orders
        .submit(&env.employee, &[own.id.clone(), foreign.id.clone()])
        .await
        .expect_err("foreign order in batch must fail");
    match err {
        AppError::Forbidden(msg) => assert!(msg.contains(&foreign.id)),
        other => panic!("unexpected error: {other:?}"),
    }

    let detail = orders.detail(&env.employee, &own.id).await.expect("own detail");
    assert_eq!(detail.order.status, OrderStatus::Draft, "own draft rolled back");
    let detail = orders
        .detail(&env.leader_b, &foreign.id)
        .await
        .expect("foreign detail");
    assert_eq!(detail.order.status, OrderStatus::Draft, "foreign draft untouched");
}

#[tokio::test]
async fn failed_update_releases_the_replacement_image() {
    let env = TestEnv::new().await;
    let orders = env.orders();

    let order = orders
        .create(&env.employee, payload("带图草稿"), Some(sample_png()))
        .await
        .expect("create with image");
    let old_ref = order.image_ref.clone().expect("image ref recorded");

    // 用触发器让行更新失败，模拟存储层写入错误
    sqlx::query(
        "CREATE TRIGGER block_order_updates BEFORE UPDATE ON orders \
         BEGIN SELECT RAISE(ABORT, 'maintenance'); END;",
    )
    .execute(&env.pool)
    .await
    .expect("install trigger");

    let replace = OrderUpdate {
        item_name: None,
        quantity: None,
        price: None,
        comment: None,
    };
    let err = orders
        .update(&env.employee, &order.id, replace, Some(sample_png()))
        .await
        .expect_err("row update must fail");
    assert!(matches!(err, AppError::Database(_)));

    // 新图片已被回收，磁盘上只剩旧图片
    assert!(env.images.fetch(&old_ref).is_ok(), "old blob untouched");
    let images_dir = env._dir.path().join("uploads/images");
    let stored = std::fs::read_dir(&images_dir).expect("images dir").count();
    assert_eq!(stored, 1, "replacement blob reclaimed on failure");
}

#[tokio::test]
async fn concurrent_decisions_have_a_single_winner() {
    let env = TestEnv::new().await;
    let orders = env.orders();

    let order = orders
        .create(&env.employee, payload("服务器内存"), None)
        .await
        .expect("create draft");
    orders
        .submit(&env.employee, &[order.id.clone()])
        .await
        .expect("submit");

    // 同时批准和驳回：恰好一个生效，另一个收到状态冲突
    let first = env.approvals();
    let second = env.approvals();
    let (approve, reject) = tokio::join!(
        first.decide(&env.leader, &order.id, Decision::Approve, None),
        second.decide(&env.leader, &order.id, Decision::Reject, Some("重复申报".to_string())),
    );

    let winners = [approve.is_ok(), reject.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(winners, 1, "exactly one decision may take effect");
    let loser = if approve.is_err() { approve } else { reject };
    assert!(matches!(loser, Err(AppError::InvalidTransition(_))));

    let detail = orders.detail(&env.leader, &order.id).await.expect("detail");
    let expected = if detail.order.reject_reason.is_some() {
        OrderStatus::Rejected
    } else {
        OrderStatus::PendingCenterDirector
    };
    assert_eq!(detail.order.status, expected);
    assert!(detail.order.status.is_terminal() || detail.order.reject_reason.is_none());
}

#[tokio::test]
async fn drafts_are_the_only_editable_and_deletable_state() {
    let env = TestEnv::new().await;
    let orders = env.orders();

    let order = orders
        .create(&env.employee, payload("碳粉盒"), None)
        .await
        .expect("create draft");

    // 草稿可编辑
    let update = OrderUpdate {
        item_name: Some("碳粉盒 (双支装)".to_string()),
        quantity: Some(4),
        price: None,
        comment: Some("打印室申领".to_string()),
    };
    let updated = orders
        .update(&env.employee, &order.id, update, None)
        .await
        .expect("update draft");
    assert_eq!(updated.item_name, "碳粉盒 (双支装)");
    assert_eq!(updated.quantity, 4);
    assert_eq!(updated.price, order.price, "unset fields keep their values");

    // 其他人不能编辑
    let foreign_update = OrderUpdate {
        item_name: Some("篡改".to_string()),
        quantity: None,
        price: None,
        comment: None,
    };
    let err = orders
        .update(&env.leader, &order.id, foreign_update, None)
        .await
        .expect_err("only the creator edits");
    assert!(matches!(err, AppError::Forbidden(_)));

    orders
        .submit(&env.employee, &[order.id.clone()])
        .await
        .expect("submit");

    // 上报后不可编辑、不可删除
    let late_update = OrderUpdate {
        item_name: Some("太迟了".to_string()),
        quantity: None,
        price: None,
        comment: None,
    };
    let err = orders
        .update(&env.employee, &order.id, late_update, None)
        .await
        .expect_err("submitted order is frozen");
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let err = orders
        .delete(&env.employee, &order.id)
        .await
        .expect_err("submitted order is not deletable");
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn image_follows_order_lifecycle() {
    let env = TestEnv::new().await;
    let orders = env.orders();

    let order = orders
        .create(&env.employee, payload("样品照片"), Some(sample_png()))
        .await
        .expect("create with image");
    let image_ref = order.image_ref.clone().expect("image ref recorded");

    let bytes = orders
        .image(&env.employee, &order.id)
        .await
        .expect("fetch image");
    assert!(!bytes.is_empty());

    // 替换图片后旧文件被回收
    let replace = OrderUpdate {
        item_name: None,
        quantity: None,
        price: None,
        comment: None,
    };
    let updated = orders
        .update(&env.employee, &order.id, replace, Some(sample_png()))
        .await
        .expect("replace image");
    let new_ref = updated.image_ref.clone().expect("new image ref");
    assert_ne!(new_ref, image_ref);
    assert!(env.images.fetch(&image_ref).is_err(), "old blob removed");
    assert!(env.images.fetch(&new_ref).is_ok());

    // 删除草稿连同附件
    orders
        .delete(&env.employee, &order.id)
        .await
        .expect("delete draft");
    assert!(env.images.fetch(&new_ref).is_err(), "blob removed with order");

    let err = orders
        .image(&env.employee, &order.id)
        .await
        .expect_err("order gone");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn center_director_does_not_create_orders() {
    let env = TestEnv::new().await;
    let orders = env.orders();

    let err = orders
        .create(&env.director, payload("不该出现"), None)
        .await
        .expect_err("director has no department to file under");
    assert!(matches!(err, AppError::Forbidden(_)));
}
