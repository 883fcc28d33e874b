use super::*;
use crate::manifest::{parse_manifest, Role};

fn plan(source: &str) -> (Manifest, Plan) {
    let manifest = parse_manifest(source).unwrap_or_else(|errs| {
        panic!(
            "manifest should parse, got: {:?}",
            errs.iter().map(|e| &e.message).collect::<Vec<_>>()
        )
    });
    let plan = Plan::build(&manifest).unwrap_or_else(|errs| {
        panic!(
            "plan should build, got: {:?}",
            errs.iter().map(|e| &e.message).collect::<Vec<_>>()
        )
    });
    (manifest, plan)
}

fn plan_err(source: &str) -> Vec<String> {
    let manifest = parse_manifest(source).expect("manifest should parse");
    match Plan::build(&manifest) {
        Ok(_) => panic!("plan should be rejected"),
        Err(errs) => errs.into_iter().map(|e| e.message).collect(),
    }
}

const VADD: &str = r#"<kernels program="vadd.aocx" preamble="yes">
    <kernel name="vadd">
        <input name="a" type="float" nmemb="4" arg="0">1, 2, 3, 4</input>
        <input name="b" type="float" nmemb="4" arg="1" generator="fill"/>
        <input name="n" type="int" nmemb="1" arg="4">4</input>
        <output name="c" type="float" nmemb="4" arg="2" epsilon="0.001">2, 4, 6, 8</output>
        <local type="float" nmemb="16" arg="3"/>
        <ndrange><global>4</global></ndrange>
    </kernel>
</kernels>"#;

fn id(kernel: usize, index: usize) -> VarId {
    VarId { kernel, index }
}

// ── classification ─────────────────────────────────────────

#[test]
fn test_classification() {
    let (_, plan) = plan(VADD);
    let a = plan.class(id(0, 0));
    assert_eq!(a.storage, Storage::Array { count: 4 });
    assert_eq!(a.init, Init::Literal("1, 2, 3, 4".to_string()));
    assert!(!a.heap_value());

    let b = plan.class(id(0, 1));
    assert_eq!(b.init, Init::Generator("fill".to_string()));
    assert!(b.heap_value());

    let n = plan.class(id(0, 2));
    assert_eq!(n.storage, Storage::Scalar);
    assert_eq!(n.format, "d");

    let c = plan.class(id(0, 3));
    assert_eq!(c.init, Init::External);
    assert_eq!(c.reference, Some(Init::Literal("2, 4, 6, 8".to_string())));
    assert!(c.heap_value());
    assert!(!c.heap_reference());
    assert_eq!(c.format, "f");

    let scratch = plan.class(id(0, 4));
    assert_eq!(scratch.role, Role::Local);
    assert!(!scratch.heap_value());
}

#[test]
fn test_repeat_scales_host_variables_only() {
    let (_, plan) = plan(
        r#"<kernels program="p" repeat="3">
    <kernel name="k">
        <input name="x" type="int" nmemb="1" arg="0"/>
        <output name="y" type="int" nmemb="2" arg="1" novalidation="yes"/>
        <local type="int" nmemb="8" arg="2"/>
        <ndrange><global>2</global></ndrange>
    </kernel>
</kernels>"#,
    );
    assert_eq!(plan.class(id(0, 0)).storage, Storage::Array { count: 3 });
    assert_eq!(plan.class(id(0, 1)).storage, Storage::Array { count: 6 });
    assert_eq!(plan.class(id(0, 1)).reference, None);
    assert_eq!(plan.class(id(0, 2)).storage, Storage::Array { count: 8 });
}

#[test]
fn test_vector_classification() {
    let (_, plan) = plan(
        r#"<kernels program="p">
    <kernel name="k">
        <output name="v" type="cl_double2" nmemb="8" arg="0" generator="expect"/>
        <ndrange><global>8</global></ndrange>
    </kernel>
</kernels>"#,
    );
    let v = plan.class(id(0, 0));
    assert_eq!(v.vector.map(|v| v.lanes), Some(2));
    assert_eq!(v.format, "lf");
    assert!(v.heap_reference());
}

#[test]
fn test_unknown_vector_type_is_rejected() {
    let errs = plan_err(
        r#"<kernels program="p">
    <kernel name="k">
        <input name="a" type="cl_float5" nmemb="2" arg="0"/>
        <input name="b" type="cl_quad2" nmemb="2" arg="1"/>
        <ndrange><global>2</global></ndrange>
    </kernel>
</kernels>"#,
    );
    assert_eq!(errs.len(), 2);
    assert!(errs[0].contains("unknown OpenCL vector type 'cl_float5'"));
}

#[test]
fn test_unknown_scalar_type_uses_fallback_format() {
    let (_, plan) = plan(
        r#"<kernels program="p">
    <kernel name="k">
        <output name="o" type="pixel_t" nmemb="1" arg="0"/>
        <ndrange><global>1</global></ndrange>
    </kernel>
</kernels>"#,
    );
    assert_eq!(plan.class(id(0, 0)).format, crate::ctype::FALLBACK_FORMAT);
    assert_eq!(plan.buffers[0].byte_size, None);
}

// ── signature ──────────────────────────────────────────────

#[test]
fn test_signature() {
    let (_, plan) = plan(VADD);
    let names: Vec<_> = plan.signature.params().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "n", "c", "cC"]);
    assert_eq!(plan.signature.params()[0].ty, "float *");
    assert_eq!(plan.signature.params()[2].ty, "int");
    assert_eq!(
        plan.signature.call_arguments(false),
        "a, 4, b, 4, n, c, 4, cC, 4"
    );
    assert_eq!(
        plan.signature.formal_names(true),
        "a, aSz, b, bSz, n, c, cSz, cC, cCSz, loopFlag"
    );
    assert_eq!(plan.signature.formal_docs().len(), 9);
}

#[test]
fn test_empty_signature() {
    let (_, plan) = plan(
        r#"<kernels program="p"><kernel name="k"><ndrange><global>1</global></ndrange></kernel></kernels>"#,
    );
    assert!(plan.signature.is_empty());
    assert_eq!(plan.signature.call_arguments(false), "");
    assert_eq!(plan.signature.call_arguments(true), "loopFlag");
}

// ── schedule ───────────────────────────────────────────────

const PIPELINE: &str = r#"<kernels program="p">
    <kernel name="load" order="0"><input name="x" type="int" nmemb="4" arg="0"/><ndrange><global>4</global></ndrange></kernel>
    <kernel name="scale" order="5"><output name="y" type="int" nmemb="4" arg="0"/><ndrange><global>4</global></ndrange></kernel>
    <kernel name="shift" order="0"><input name="z" type="int" nmemb="4" arg="0"/><ndrange><global>4</global></ndrange></kernel>
</kernels>"#;

#[test]
fn test_unordered_kernels_share_one_tier() {
    let (_, plan) = plan(VADD);
    assert_eq!(plan.schedule.tiers.len(), 1);
    assert_eq!(plan.schedule.sync_points(), 0);
    let launches = plan.schedule.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].wait, None);
    assert_eq!(launches[0].signal, None);
}

#[test]
fn test_ordered_tiers() {
    let (_, plan) = plan(PIPELINE);
    let tiers: Vec<_> = plan.schedule.tiers.iter().map(|t| t.kernels.clone()).collect();
    assert_eq!(tiers, vec![vec![0, 2], vec![1]]);
    assert_eq!(plan.schedule.sync_points(), 1);
    assert_eq!(plan.schedule.list_len(0), 2);
    assert_eq!(Schedule::list_name(0), "tier0Done");

    let launches = plan.schedule.launches();
    assert_eq!(
        launches,
        vec![
            LaunchSlot { kernel: 0, wait: None, signal: Some((0, 0)) },
            LaunchSlot { kernel: 2, wait: None, signal: Some((0, 1)) },
            LaunchSlot { kernel: 1, wait: Some(0), signal: None },
        ]
    );
}

#[test]
fn test_mixed_order_is_rejected() {
    let errs = plan_err(
        r#"<kernels program="p">
    <kernel name="a" order="1"><ndrange><global>1</global></ndrange></kernel>
    <kernel name="b"><ndrange><global>1</global></ndrange></kernel>
    <kernel name="c"><ndrange><global>1</global></ndrange></kernel>
</kernels>"#,
    );
    assert_eq!(
        errs,
        vec![
            "kernel 'b' has no 'order' but other kernels do",
            "kernel 'c' has no 'order' but other kernels do",
        ]
    );
}

#[test]
fn test_empty_schedule() {
    let schedule = Schedule::resolve(&[]).unwrap();
    assert!(schedule.tiers.is_empty());
    assert_eq!(schedule.sync_points(), 0);
    assert!(schedule.launches().is_empty());
}

// ── buffers and bindings ───────────────────────────────────

#[test]
fn test_single_template_buffers() {
    let (_, plan) = plan(VADD);
    let handles: Vec<_> = plan.buffers.iter().map(|b| b.handle.as_str()).collect();
    assert_eq!(handles, vec!["aK", "bK", "cK"]);

    let a = &plan.buffers[0];
    assert_eq!(a.flags, MemFlags::ReadOnly);
    assert_eq!(a.upload, Transfer::Once);
    assert_eq!(a.download, Transfer::Never);
    assert_eq!(a.byte_size, Some(16));
    assert_eq!(a.size_expr(), "4 * sizeof(float)");
    assert_eq!(a.queue, "Vadd");

    let c = &plan.buffers[2];
    assert_eq!(c.flags, MemFlags::ReadWriteCopyHost);
    assert_eq!(c.flags.as_c(), "CL_MEM_READ_WRITE | CL_MEM_COPY_HOST_PTR");
    assert_eq!(c.upload, Transfer::Never);
    assert_eq!(c.download, Transfer::Once);
    assert_eq!(c.host_ptr(), "c");
}

#[test]
fn test_loop_template_buffers_and_rebinding() {
    let (_, plan) = plan(
        r#"<kernels program="p" looppostamble="yes">
    <kernel name="k">
        <input name="a" type="int" nmemb="4" arg="0"/>
        <input name="s" type="int" nmemb="1" arg="1"/>
        <output name="o" type="int" nmemb="1" arg="2"/>
        <ndrange><global>4</global></ndrange>
    </kernel>
</kernels>"#,
    );
    assert_eq!(plan.buffers.len(), 2);
    assert_eq!(plan.buffers[0].upload, Transfer::EveryIteration);
    let o = &plan.buffers[1];
    assert_eq!(o.flags, MemFlags::ReadWrite);
    assert_eq!(o.upload, Transfer::EveryIteration);
    assert_eq!(o.download, Transfer::EveryIteration);
    assert_eq!(o.host_ptr(), "&o");

    let args = &plan.bindings[0];
    assert!(!args[0].rebind_each_iteration);
    assert!(args[1].rebind_each_iteration);
    assert_eq!(args[1].binding.value_expr(), "&s");
    assert_eq!(args[1].binding.size_expr(), "sizeof(int)");
}

#[test]
fn test_bindings_sorted_by_index() {
    let (_, plan) = plan(VADD);
    let args = &plan.bindings[0];
    let indices: Vec<_> = args.iter().map(|a| a.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(args[3].label, "__local 3");
    assert_eq!(args[3].binding.size_expr(), "16 * sizeof(float)");
    assert_eq!(args[3].binding.value_expr(), "NULL");
    assert_eq!(args[2].binding, Binding::Handle { handle: "cK".to_string() });
    assert_eq!(args[4].binding.value_expr(), "&n");
    assert!(args.iter().all(|a| !a.rebind_each_iteration));
    for arg in args {
        if let Binding::Handle { handle } = &arg.binding {
            assert!(plan.buffers.iter().any(|b| &b.handle == handle));
        }
    }
}

// ── validation ─────────────────────────────────────────────

#[test]
fn test_validation_shapes() {
    let (_, plan) = plan(
        r#"<kernels program="p">
    <kernel name="k">
        <output name="arr" type="float" nmemb="4" arg="0" epsilon="0.5"/>
        <output name="vec" type="cl_int4" nmemb="1" arg="1"/>
        <output name="both" type="cl_float2" nmemb="3" arg="2"/>
        <output name="skip" type="int" nmemb="3" arg="3" novalidation="true"/>
        <output name="one" type="int" nmemb="1" arg="4"/>
        <ndrange><global>4</global></ndrange>
    </kernel>
</kernels>"#,
    );
    let v = &plan.validations;
    assert_eq!(v.len(), 4);

    assert_eq!(v[0].test(), "TEST_EPSILON(arrC[i], arr[i], arrEpsilon)");
    assert_eq!(v[0].location(), "arr[%d]");
    assert_eq!(v[0].comparison.note(), " (with epsilon)");

    assert_eq!(v[1].test(), "vecC.s[i] != vec.s[i]");
    assert_eq!(v[1].loops(), vec![("i", 4)]);
    assert_eq!(v[1].location_args(), vec!["i"]);

    assert_eq!(v[2].test(), "bothC[i].s[j] != both[i].s[j]");
    assert_eq!(v[2].loops(), vec![("i", 3), ("j", 2)]);
    assert_eq!(v[2].location(), "both[%d].s[%d]");
    assert_eq!(v[2].comparisons(), 6);

    assert_eq!(v[3].test(), "oneC != one");
    assert!(v[3].loops().is_empty());
    assert!(v[3].location_args().is_empty());
}

#[test]
fn test_epsilon_comparison_semantics() {
    let eps = Comparison::Epsilon {
        var: "cEpsilon".to_string(),
        text: "0.1".to_string(),
        value: 0.1,
    };
    assert!(!eps.mismatches(1.0, 1.05));
    assert!(!eps.mismatches(1.05, 1.0));
    assert!(eps.mismatches(1.0, 1.2));
    assert!(eps.mismatches(1.2, 1.0));
    assert!(!eps.mismatches(2.0, 2.0));

    let loose = Comparison::Epsilon {
        var: "rEpsilon".to_string(),
        text: "0.01".to_string(),
        value: 0.01,
    };
    let tight = Comparison::Epsilon {
        var: "rEpsilon".to_string(),
        text: "0.0001".to_string(),
        value: 0.0001,
    };
    assert!(!loose.mismatches(5.0, 5.0009));
    assert!(!loose.mismatches(5.0009, 5.0));
    assert!(tight.mismatches(5.0, 5.0009));
    assert!(tight.mismatches(5.0009, 5.0));

    assert!(Comparison::Exact.mismatches(1.0, 1.0000001));
    assert!(!Comparison::Exact.mismatches(3.0, 3.0));
}
